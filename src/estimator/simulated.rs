//! Stand-in estimator that produces plausible readings from noise.
//!
//! No camera data reaches this path. The real eye-aspect-ratio pipeline lives
//! in `crate::vision` and can replace this strategy behind [`Estimator`].

use std::time::Duration;

use crate::tracking::state::{EyePosition, TrackingSnapshot};

use super::{
    random::RandomSource, DrowsinessEstimate, Estimator, EstimatorEvent, EyeEstimate,
};

const DETECTION_PROBABILITY_TRACKED: f64 = 0.98;
const DETECTION_PROBABILITY_LOST: f64 = 0.7;

const BASE_BLINK_RATE: f64 = 12.0;
const BLINK_RATE_JITTER: f64 = 4.0;
const EYE_STEP: f64 = 1.0;

const LEFT_EYE_X: (f64, f64) = (50.0, 150.0);
const RIGHT_EYE_X: (f64, f64) = (200.0, 300.0);
const EYE_Y: (f64, f64) = (100.0, 200.0);

const DROWSINESS_PER_MINUTE: f64 = 5.0;
const DROWSINESS_BASELINE_CAP: f64 = 40.0;
const DROWSINESS_NOISE: f64 = 15.0;
const DROWSY_LEVEL: f64 = 70.0;

const SPIKE_AFTER_MINUTES: f64 = 2.0;
const SPIKE_PROBABILITY: f64 = 0.05;
const SPIKE_FLOOR: f64 = 75.0;
const SPIKE_RANGE: f64 = 25.0;

pub struct SimulatedEstimator<R> {
    random: R,
}

impl<R: RandomSource> SimulatedEstimator<R> {
    pub fn new(random: R) -> Self {
        Self { random }
    }

    fn walk(&mut self, position: EyePosition, x_bounds: (f64, f64)) -> EyePosition {
        let x = position.x + self.random.uniform(-EYE_STEP, EYE_STEP);
        let y = position.y + self.random.uniform(-EYE_STEP, EYE_STEP);
        EyePosition::new(
            x.clamp(x_bounds.0, x_bounds.1),
            y.clamp(EYE_Y.0, EYE_Y.1),
        )
    }
}

impl<R: RandomSource> Estimator for SimulatedEstimator<R> {
    fn estimate_eyes(&mut self, previous: &TrackingSnapshot) -> EyeEstimate {
        let probability = if previous.eyes_detected {
            DETECTION_PROBABILITY_TRACKED
        } else {
            DETECTION_PROBABILITY_LOST
        };

        if !self.random.chance(probability) {
            return EyeEstimate {
                eyes_detected: false,
                left_eye: previous.left_eye,
                right_eye: previous.right_eye,
                blink_rate: previous.blink_rate,
            };
        }

        let left_eye = self.walk(previous.left_eye, LEFT_EYE_X);
        let right_eye = self.walk(previous.right_eye, RIGHT_EYE_X);
        let blink_rate = BASE_BLINK_RATE
            + self.random.uniform(-BLINK_RATE_JITTER, BLINK_RATE_JITTER);

        EyeEstimate {
            eyes_detected: true,
            left_eye,
            right_eye,
            blink_rate: blink_rate.max(0.0),
        }
    }

    fn estimate_drowsiness(
        &mut self,
        _previous: &TrackingSnapshot,
        elapsed: Duration,
    ) -> DrowsinessEstimate {
        let minutes = elapsed.as_secs_f64() / 60.0;
        let baseline = (minutes * DROWSINESS_PER_MINUTE).min(DROWSINESS_BASELINE_CAP);
        let level = baseline + self.random.uniform(-DROWSINESS_NOISE, DROWSINESS_NOISE);

        if minutes > SPIKE_AFTER_MINUTES && self.random.chance(SPIKE_PROBABILITY) {
            let spike = (SPIKE_FLOOR + self.random.uniform(0.0, SPIKE_RANGE)).min(100.0);
            return DrowsinessEstimate {
                level: spike,
                is_drowsy: true,
                events: vec![EstimatorEvent::DrowsinessDetected { level: spike }],
            };
        }

        DrowsinessEstimate {
            level: level.clamp(0.0, 100.0),
            is_drowsy: level > DROWSY_LEVEL,
            events: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::random::{ScriptedRandom, StdRandom};

    fn minutes(value: u64) -> Duration {
        Duration::from_secs(value * 60)
    }

    #[test]
    fn detection_uses_hysteresis() {
        let tracked = TrackingSnapshot {
            eyes_detected: true,
            ..TrackingSnapshot::default()
        };
        let lost = TrackingSnapshot::default();

        let mut estimator = SimulatedEstimator::new(ScriptedRandom::new(vec![0.9, 0.5]));
        assert!(estimator.estimate_eyes(&tracked).eyes_detected);

        let mut estimator = SimulatedEstimator::new(ScriptedRandom::new(vec![0.9]));
        let estimate = estimator.estimate_eyes(&lost);
        assert!(!estimate.eyes_detected);
        assert_eq!(estimate.left_eye, lost.left_eye);
        assert_eq!(estimate.blink_rate, lost.blink_rate);
    }

    #[test]
    fn detected_eyes_walk_within_bounds() {
        let at_edge = TrackingSnapshot {
            eyes_detected: true,
            left_eye: EyePosition::new(150.0, 100.0),
            right_eye: EyePosition::new(200.0, 200.0),
            ..TrackingSnapshot::default()
        };
        // detect, left +x -y, right -x +y, blink jitter 0
        let draws = vec![0.0, 0.99, 0.0, 0.0, 0.99, 0.5];
        let mut estimator = SimulatedEstimator::new(ScriptedRandom::new(draws));

        let estimate = estimator.estimate_eyes(&at_edge);
        assert!(estimate.eyes_detected);
        assert_eq!(estimate.left_eye, EyePosition::new(150.0, 100.0));
        assert_eq!(estimate.right_eye, EyePosition::new(200.0, 200.0));
        assert_eq!(estimate.blink_rate, 12.0);
    }

    #[test]
    fn baseline_grows_then_caps() {
        let snapshot = TrackingSnapshot::default();

        let mut estimator = SimulatedEstimator::new(ScriptedRandom::new(vec![0.5]));
        let early = estimator.estimate_drowsiness(&snapshot, minutes(1));
        assert!((early.level - 5.0).abs() < 1e-9);
        assert!(!early.is_drowsy);

        // past two minutes the spike draw follows the noise draw
        let mut estimator = SimulatedEstimator::new(ScriptedRandom::new(vec![0.5, 0.9]));
        let late = estimator.estimate_drowsiness(&snapshot, minutes(30));
        assert!((late.level - 40.0).abs() < 1e-9);
        assert!(late.events.is_empty());
    }

    #[test]
    fn spike_raises_event_after_two_minutes() {
        let snapshot = TrackingSnapshot::default();
        let mut estimator =
            SimulatedEstimator::new(ScriptedRandom::new(vec![0.5, 0.01, 0.4]));

        let estimate = estimator.estimate_drowsiness(&snapshot, minutes(3));
        assert!((estimate.level - 85.0).abs() < 1e-9);
        assert!(estimate.is_drowsy);
        assert_eq!(
            estimate.events,
            vec![EstimatorEvent::DrowsinessDetected { level: estimate.level }]
        );
    }

    #[test]
    fn no_spike_before_two_minutes() {
        let snapshot = TrackingSnapshot::default();
        let mut estimator = SimulatedEstimator::new(ScriptedRandom::new(vec![0.5, 0.0]));

        let estimate = estimator.estimate_drowsiness(&snapshot, Duration::from_secs(119));
        assert!(estimate.events.is_empty());
        assert!(estimate.level < 10.0);
    }

    #[test]
    fn outputs_stay_in_range() {
        let mut estimator = SimulatedEstimator::new(StdRandom::seeded(42));
        let mut snapshot = TrackingSnapshot::default();

        for step in 0..5_000u64 {
            let eyes = estimator.estimate_eyes(&snapshot);
            snapshot = snapshot.with_eyes(&eyes);
            let drowsiness =
                estimator.estimate_drowsiness(&snapshot, Duration::from_secs(step));
            snapshot = snapshot.with_drowsiness(&drowsiness);

            assert!(snapshot.blink_rate >= 0.0);
            assert!((0.0..=100.0).contains(&snapshot.drowsiness_level));
            assert!((50.0..=150.0).contains(&snapshot.left_eye.x));
            assert!((200.0..=300.0).contains(&snapshot.right_eye.x));
            assert!((100.0..=200.0).contains(&snapshot.left_eye.y));
        }
    }
}
