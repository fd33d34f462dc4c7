//! Aggregate session readings, one row per persistence tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub blink_rate: f64,
    /// 0-100
    pub drowsiness_level: f64,
    pub session_duration_minutes: f64,
    pub drowsiness_detected: bool,
    pub session_id: String,
    pub breaks_taken: u32,
    pub notes: String,
}

/// Scalar aggregates over one time window.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WindowSummary {
    pub average_blink_rate: f64,
    pub drowsy_episodes: u32,
    pub total_session_minutes: f64,
}
