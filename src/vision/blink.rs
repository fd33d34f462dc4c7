use std::collections::VecDeque;

use serde::Serialize;

use super::{ANALYSIS_WINDOW_MS, EAR_CLOSED_THRESHOLD};

const MIN_HEALTHY_BLINK_RATE: f64 = 15.0;
const MAX_HEALTHY_BLINK_RATE: f64 = 20.0;
/// Closures longer than this are not blinks.
const MAX_BLINK_DURATION_MS: u64 = 400;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BlinkHealth {
    VeryLow,
    Low,
    Healthy,
    SlightlyElevated,
    High,
}

impl BlinkHealth {
    pub fn from_rate(rate: f64) -> Self {
        if rate < MIN_HEALTHY_BLINK_RATE * 0.7 {
            BlinkHealth::VeryLow
        } else if rate < MIN_HEALTHY_BLINK_RATE {
            BlinkHealth::Low
        } else if rate > MAX_HEALTHY_BLINK_RATE * 1.3 {
            BlinkHealth::High
        } else if rate > MAX_HEALTHY_BLINK_RATE {
            BlinkHealth::SlightlyElevated
        } else {
            BlinkHealth::Healthy
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            BlinkHealth::VeryLow => "Your blink rate is very low. Take a break and use eye drops.",
            BlinkHealth::Low => {
                "Your blink rate is lower than recommended. Try to blink more often."
            }
            BlinkHealth::High => {
                "Your blink rate is unusually high. This may indicate eye irritation."
            }
            BlinkHealth::SlightlyElevated => {
                "Your blink rate is slightly elevated. Check for eye irritants."
            }
            BlinkHealth::Healthy => "Your blink rate is within the healthy range.",
        }
    }
}

/// Turns a stream of EAR readings into blinks and a rolling blink rate.
#[derive(Debug, Default)]
pub struct BlinkAnalyzer {
    blinks: VecDeque<u64>,
    closed_since: Option<u64>,
    total_blink_duration_ms: u64,
    blink_count: u64,
}

impl BlinkAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one reading. Returns true when it completes a blink.
    pub fn analyze_ear(&mut self, ear: f64, timestamp_ms: u64) -> bool {
        match self.closed_since {
            None if ear < EAR_CLOSED_THRESHOLD => {
                self.closed_since = Some(timestamp_ms);
                false
            }
            Some(started) if ear >= EAR_CLOSED_THRESHOLD => {
                self.closed_since = None;
                let duration = timestamp_ms.saturating_sub(started);
                if duration > MAX_BLINK_DURATION_MS {
                    return false;
                }
                self.total_blink_duration_ms += duration;
                self.record_blink(timestamp_ms);
                true
            }
            _ => false,
        }
    }

    pub fn record_blink(&mut self, timestamp_ms: u64) {
        self.blinks.push_back(timestamp_ms);
        self.blink_count += 1;

        let window_start = timestamp_ms.saturating_sub(ANALYSIS_WINDOW_MS);
        while self.blinks.front().is_some_and(|&t| t < window_start) {
            self.blinks.pop_front();
        }
    }

    /// Blinks per minute over the last minute, or over the time since the
    /// oldest retained blink when less than a minute has been observed.
    pub fn blink_rate(&self, now_ms: u64) -> f64 {
        let window_start = now_ms.saturating_sub(ANALYSIS_WINDOW_MS);
        let in_window = self.blinks.iter().filter(|&&t| t >= window_start).count();

        let oldest = self.blinks.front().copied().unwrap_or(now_ms);
        let covered = now_ms.saturating_sub(oldest).min(ANALYSIS_WINDOW_MS);
        if covered == 0 {
            return 0.0;
        }
        in_window as f64 * 60_000.0 / covered as f64
    }

    pub fn is_dry_eyes_likely(&self, now_ms: u64) -> bool {
        self.blink_rate(now_ms) < MIN_HEALTHY_BLINK_RATE
    }

    pub fn average_blink_duration_ms(&self) -> f64 {
        if self.blink_count == 0 {
            return 0.0;
        }
        self.total_blink_duration_ms as f64 / self.blink_count as f64
    }

    pub fn health(&self, now_ms: u64) -> BlinkHealth {
        BlinkHealth::from_rate(self.blink_rate(now_ms))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
