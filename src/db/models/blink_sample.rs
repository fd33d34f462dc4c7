//! Per-tick blink readings written while a session is tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blink rate (blinks/minute) below which a sample is flagged as low.
pub const LOW_BLINK_RATE: f64 = 10.0;

/// Placeholder blink duration until a real blink detector feeds the loop.
pub const DEFAULT_BLINK_DURATION_MS: f64 = 200.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlinkSample {
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub blink_rate: f64,
    pub blink_duration_ms: f64,
    pub session_id: String,
    pub is_low_rate: bool,
}

impl BlinkSample {
    pub fn new(session_id: &str, timestamp: DateTime<Utc>, blink_rate: f64) -> Self {
        Self {
            id: None,
            timestamp,
            blink_rate,
            blink_duration_ms: DEFAULT_BLINK_DURATION_MS,
            session_id: session_id.to_string(),
            is_low_rate: blink_rate < LOW_BLINK_RATE,
        }
    }
}
