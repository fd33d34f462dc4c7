//! Camera-side analysis built on the eye aspect ratio (EAR), plus gaze
//! direction for hands-free control.
//!
//! Frame timestamps are milliseconds on the capture clock. None of this is
//! driven by the tracking loop yet; a landmark-based estimator would feed it.

mod blink;
mod ear;
mod gaze;
mod perclos;

pub use blink::{BlinkAnalyzer, BlinkHealth};
pub use ear::{eye_aspect_ratio, Point};
pub use gaze::{detect_double_blink, GazeDirection, GazeTracker};
pub use perclos::PerclosTracker;

/// EAR below which an eye counts as closed.
pub const EAR_CLOSED_THRESHOLD: f64 = 0.2;

/// Both analyzers look back over the last minute.
pub const ANALYSIS_WINDOW_MS: u64 = 60_000;
