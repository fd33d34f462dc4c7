//! Strategies that turn the previous snapshot into fresh eye readings.
//!
//! Estimators are pure: anything that should reach the outside world (an
//! alert, for example) is returned as an [`EstimatorEvent`] and dispatched by
//! the tracking loop.

mod random;
mod simulated;

use std::time::Duration;

use crate::tracking::state::{EyePosition, TrackingSnapshot};

pub use random::{RandomSource, StdRandom};
pub use simulated::SimulatedEstimator;

#[cfg(test)]
pub(crate) use random::ScriptedRandom;

#[derive(Debug, Clone, PartialEq)]
pub struct EyeEstimate {
    pub eyes_detected: bool,
    pub left_eye: EyePosition,
    pub right_eye: EyePosition,
    pub blink_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrowsinessEstimate {
    /// 0-100
    pub level: f64,
    pub is_drowsy: bool,
    pub events: Vec<EstimatorEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EstimatorEvent {
    DrowsinessDetected { level: f64 },
}

pub trait Estimator: Send + 'static {
    fn estimate_eyes(&mut self, previous: &TrackingSnapshot) -> EyeEstimate;

    /// `elapsed` is the time since the session started.
    fn estimate_drowsiness(
        &mut self,
        previous: &TrackingSnapshot,
        elapsed: Duration,
    ) -> DrowsinessEstimate;
}

impl<E: Estimator + ?Sized> Estimator for Box<E> {
    fn estimate_eyes(&mut self, previous: &TrackingSnapshot) -> EyeEstimate {
        (**self).estimate_eyes(previous)
    }

    fn estimate_drowsiness(
        &mut self,
        previous: &TrackingSnapshot,
        elapsed: Duration,
    ) -> DrowsinessEstimate {
        (**self).estimate_drowsiness(previous, elapsed)
    }
}
