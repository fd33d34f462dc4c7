pub mod blink_sample;
pub mod session_metrics;
pub mod user_preferences;

pub use blink_sample::BlinkSample;
pub use session_metrics::{SessionMetrics, WindowSummary};
pub use user_preferences::UserPreferences;
