use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};
use uuid::Uuid;

use crate::estimator::{DrowsinessEstimate, EyeEstimate};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EyePosition {
    pub x: f64,
    pub y: f64,
}

impl EyePosition {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Point-in-time view of a tracking session for the UI.
///
/// Never mutated in place once published: the loop builds a new snapshot and
/// replaces the broadcast value, so readers always see a consistent set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSnapshot {
    pub is_tracking: bool,
    pub eyes_detected: bool,
    pub left_eye: EyePosition,
    pub right_eye: EyePosition,
    /// blinks per minute
    pub blink_rate: f64,
    /// 0-100
    pub drowsiness_level: f64,
    pub is_drowsy: bool,
}

impl Default for TrackingSnapshot {
    fn default() -> Self {
        Self {
            is_tracking: false,
            eyes_detected: false,
            left_eye: EyePosition::new(100.0, 150.0),
            right_eye: EyePosition::new(250.0, 150.0),
            blink_rate: 15.0,
            drowsiness_level: 0.0,
            is_drowsy: false,
        }
    }
}

impl TrackingSnapshot {
    pub fn with_tracking(&self, is_tracking: bool) -> Self {
        Self {
            is_tracking,
            ..self.clone()
        }
    }

    pub fn with_eyes(&self, estimate: &EyeEstimate) -> Self {
        Self {
            eyes_detected: estimate.eyes_detected,
            left_eye: estimate.left_eye,
            right_eye: estimate.right_eye,
            blink_rate: estimate.blink_rate.max(0.0),
            ..self.clone()
        }
    }

    pub fn with_drowsiness(&self, estimate: &DrowsinessEstimate) -> Self {
        Self {
            drowsiness_level: estimate.level.clamp(0.0, 100.0),
            is_drowsy: estimate.is_drowsy,
            ..self.clone()
        }
    }
}

/// In-memory state of the active session. Owned by the controller and dropped
/// when the session stops.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub started_instant: Instant,
    last_stamped: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn begin() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            started_instant: Instant::now(),
            last_stamped: None,
        }
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_instant)
    }

    /// Wall-clock time at `now`: the later of the system clock and the
    /// session start plus monotonic elapsed time. The monotonic clock stops
    /// during system suspend, so the system clock wins after a sleep.
    pub fn wall_clock_at(&self, now: Instant, wall_now: DateTime<Utc>) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.elapsed_at(now))
            .unwrap_or_else(|_| chrono::Duration::zero());
        let estimate = (self.started_at + elapsed).max(wall_now);
        self.last_stamped.map_or(estimate, |last| estimate.max(last))
    }

    /// Timestamp for a row written at `now`. Never earlier than the previous
    /// stamp, even if the system clock steps back.
    pub fn stamp(&mut self, now: Instant, wall_now: DateTime<Utc>) -> DateTime<Utc> {
        let timestamp = self.wall_clock_at(now, wall_now);
        self.last_stamped = Some(timestamp);
        timestamp
    }

    /// Time between the session start and `timestamp`, suspend included.
    pub fn duration_until(&self, timestamp: DateTime<Utc>) -> Duration {
        (timestamp - self.started_at).to_std().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
}

impl From<&SessionState> for SessionInfo {
    fn from(state: &SessionState) -> Self {
        Self {
            session_id: state.session_id.clone(),
            started_at: state.started_at,
        }
    }
}

/// Returned by `stop()`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub duration_minutes: f64,
    pub samples_written: u64,
}
