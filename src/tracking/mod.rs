pub mod commands;
pub mod controller;
mod loop_worker;
pub mod sink;
pub mod state;

pub use controller::{EstimatorFactory, TrackingController};
pub use sink::MetricsSink;
pub use state::{EyePosition, SessionInfo, SessionState, SessionSummary, TrackingSnapshot};
