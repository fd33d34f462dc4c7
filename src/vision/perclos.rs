use std::collections::VecDeque;

use super::{ANALYSIS_WINDOW_MS, EAR_CLOSED_THRESHOLD};

/// PERCLOS at or above this fraction is treated as drowsy.
const DROWSY_PERCLOS: f64 = 0.6;

#[derive(Debug, Clone, Copy)]
struct Closure {
    started_ms: u64,
    duration_ms: u64,
}

/// Percentage of eye closure over the last minute.
#[derive(Debug, Default)]
pub struct PerclosTracker {
    closures: VecDeque<Closure>,
    closed_since: Option<u64>,
    level: f64,
}

impl PerclosTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_closure(&mut self, started_ms: u64, duration_ms: u64) {
        self.closures.push_back(Closure {
            started_ms,
            duration_ms,
        });

        let now_ms = started_ms + duration_ms;
        let window_start = now_ms.saturating_sub(ANALYSIS_WINDOW_MS);
        while self
            .closures
            .front()
            .is_some_and(|closure| closure.started_ms < window_start)
        {
            self.closures.pop_front();
        }

        self.level = self.perclos(now_ms) * 100.0;
    }

    /// Feeds one EAR reading and returns the drowsiness level (0-100).
    pub fn observe_ear(&mut self, ear: f64, timestamp_ms: u64) -> f64 {
        let closed = ear < EAR_CLOSED_THRESHOLD;
        match (closed, self.closed_since) {
            (true, None) => self.closed_since = Some(timestamp_ms),
            (false, Some(started)) => {
                self.closed_since = None;
                self.record_closure(started, timestamp_ms.saturating_sub(started));
            }
            _ => {}
        }

        self.level = self.perclos(timestamp_ms) * 100.0;
        self.level
    }

    /// Closed time over the window, in `[0, 1]`.
    pub fn perclos(&self, now_ms: u64) -> f64 {
        let window_start = now_ms.saturating_sub(ANALYSIS_WINDOW_MS);
        let closed_ms: u64 = self
            .closures
            .iter()
            .filter(|closure| closure.started_ms >= window_start)
            .map(|closure| closure.duration_ms)
            .sum();
        (closed_ms as f64 / ANALYSIS_WINDOW_MS as f64).clamp(0.0, 1.0)
    }

    pub fn drowsiness_level(&self) -> f64 {
        self.level
    }

    pub fn is_drowsy(&self) -> bool {
        self.level / 100.0 >= DROWSY_PERCLOS
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_closure_reaches_drowsy_threshold() {
        let mut tracker = PerclosTracker::new();
        tracker.observe_ear(0.1, 0);
        let level = tracker.observe_ear(0.3, 36_000);

        assert!((level - 60.0).abs() < 1e-9);
        assert!(tracker.is_drowsy());
    }

    #[test]
    fn short_closures_stay_alert() {
        let mut tracker = PerclosTracker::new();
        for second in 0..30u64 {
            tracker.record_closure(second * 1_000, 200);
        }

        assert!((tracker.drowsiness_level() - 10.0).abs() < 1e-9);
        assert!(!tracker.is_drowsy());
    }

    #[test]
    fn closures_expire_after_a_minute() {
        let mut tracker = PerclosTracker::new();
        tracker.record_closure(0, 40_000);
        assert!(tracker.is_drowsy());

        let level = tracker.observe_ear(0.3, 61_000);
        assert_eq!(level, 0.0);
        assert!(!tracker.is_drowsy());

        tracker.reset();
        assert_eq!(tracker.perclos(61_000), 0.0);
    }
}
