//! Window reports for the reports screen and CSV export of the same data.

pub mod commands;
mod export;
mod insights;
mod timeline;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use log::info;
use serde::Serialize;

use crate::db::{BlinkSample, Database, TimeWindow, WindowSummary};

pub use export::{export_file_name, export_session_metrics};
pub use insights::{format_screen_time, health_insights};
pub use timeline::{blink_timeline, TimelinePoint};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub window: TimeWindow,
    pub summary: WindowSummary,
    pub screen_time: String,
    pub insights: String,
    pub timeline: Vec<TimelinePoint>,
}

impl HealthReport {
    pub fn new(window: TimeWindow, summary: WindowSummary, samples: &[BlinkSample]) -> Self {
        Self {
            window,
            summary,
            screen_time: format_screen_time(summary.total_session_minutes),
            insights: health_insights(&summary, window.phrase()),
            timeline: blink_timeline(window, samples, &Local),
        }
    }
}

pub async fn health_report(db: &Database, window: TimeWindow) -> Result<HealthReport> {
    let range = window.current_range();
    let summary = db
        .window_summary(range)
        .await
        .context("failed to load window summary")?;
    let samples = db
        .blink_samples_between(range)
        .await
        .context("failed to load blink samples")?;
    Ok(HealthReport::new(window, summary, &samples))
}

/// Exports the window's session metrics to `dir`. Returns the written path.
pub async fn export_window(db: &Database, window: TimeWindow, dir: PathBuf) -> Result<PathBuf> {
    let metrics = db
        .session_metrics_between(window.current_range())
        .await
        .context("failed to load session metrics")?;
    let rows = metrics.len();

    let path = tokio::task::spawn_blocking(move || {
        export_session_metrics(&metrics, &dir, Local::now())
    })
    .await
    .context("export worker join failed")??;

    info!("exported {rows} rows to {}", path.display());
    Ok(path)
}
