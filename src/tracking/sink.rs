use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::db::{BlinkSample, Database, SessionMetrics, UserPreferences};

/// Storage the tracking loop writes through.
#[async_trait]
pub trait MetricsSink: Send + Sync + 'static {
    /// Preferences in force when a session starts.
    async fn preferences(&self) -> Result<UserPreferences>;

    async fn persist(&self, blink: &BlinkSample, metrics: &SessionMetrics) -> Result<()>;
}

#[async_trait]
impl MetricsSink for Database {
    async fn preferences(&self) -> Result<UserPreferences> {
        self.get_user_preferences().await
    }

    async fn persist(&self, blink: &BlinkSample, metrics: &SessionMetrics) -> Result<()> {
        self.insert_sample_pair(blink, metrics)
            .await
            .context("failed to persist sample pair")?;
        Ok(())
    }
}
