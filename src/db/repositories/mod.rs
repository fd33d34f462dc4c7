mod blink_samples;
mod session_metrics;
mod user_preferences;

use crate::db::{
    connection::{Database, Table},
    live::LiveQuery,
    models::{BlinkSample, SessionMetrics, UserPreferences, WindowSummary},
    window::TimeWindow,
};

use anyhow::{Context, Result};

use blink_samples::{query_blink_samples_between, write_blink_sample};
use session_metrics::{query_session_metrics_between, query_window_summary, write_session_metrics};
use user_preferences::query_user_preferences;

impl Database {
    /// Store one tick's blink sample and metrics row together. Either both
    /// rows land or neither does.
    pub async fn insert_sample_pair(
        &self,
        blink: &BlinkSample,
        metrics: &SessionMetrics,
    ) -> Result<(i64, i64)> {
        let blink = blink.clone();
        let metrics = metrics.clone();
        self.execute_write(&[Table::BlinkSamples, Table::SessionMetrics], move |conn| {
            let tx = conn.transaction()?;
            let blink_id = write_blink_sample(&tx, &blink)?;
            let metrics_id = write_session_metrics(&tx, &metrics)?;
            tx.commit().context("failed to commit sample pair")?;
            Ok((blink_id, metrics_id))
        })
        .await
    }
}

// Window bounds are resolved on every re-run so "today" keeps advancing.
impl Database {
    pub fn watch_blink_samples(&self, window: TimeWindow) -> LiveQuery<Vec<BlinkSample>> {
        LiveQuery::new(self.clone(), &[Table::BlinkSamples], move |conn| {
            query_blink_samples_between(conn, window.current_range())
        })
    }

    pub fn watch_session_metrics(&self, window: TimeWindow) -> LiveQuery<Vec<SessionMetrics>> {
        LiveQuery::new(self.clone(), &[Table::SessionMetrics], move |conn| {
            query_session_metrics_between(conn, window.current_range())
        })
    }

    pub fn watch_window_summary(&self, window: TimeWindow) -> LiveQuery<WindowSummary> {
        LiveQuery::new(
            self.clone(),
            &[Table::BlinkSamples, Table::SessionMetrics],
            move |conn| query_window_summary(conn, window.current_range()),
        )
    }

    pub fn watch_user_preferences(&self) -> LiveQuery<UserPreferences> {
        LiveQuery::new(self.clone(), &[Table::UserPreferences], |conn| {
            query_user_preferences(conn)
        })
    }
}
