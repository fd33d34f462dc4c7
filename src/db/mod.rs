mod connection;
mod helpers;
mod live;
mod migrations;
pub mod models;
mod repositories;
mod window;

pub use connection::{Database, Table};
pub use live::LiveQuery;
pub use models::{BlinkSample, SessionMetrics, UserPreferences, WindowSummary};
pub use window::{TimeRange, TimeWindow};
