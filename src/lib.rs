pub mod config;
pub mod db;
pub mod estimator;
pub mod notify;
pub mod preferences_commands;
pub mod reports;
pub mod tracking;
pub mod vision;
mod utils;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use log::{error, info};

use config::{app_data_dir, ConfigStore};
use db::{Database, TimeWindow};
use estimator::{Estimator, SimulatedEstimator, StdRandom};
use notify::LogNotifier;
use tracking::{
    commands::{start_tracking, stop_tracking},
    TrackingController,
};

/// Everything the command layer needs, shared by the host for the lifetime
/// of the app.
pub struct AppState {
    pub db: Database,
    pub tracking: TrackingController,
    pub config: ConfigStore,
}

impl AppState {
    pub fn initialize(config_path: PathBuf) -> Result<Self> {
        let config_store = ConfigStore::new(config_path)?;
        let config = config_store.config().apply_env_overrides();

        let database = Database::new(config.resolved_database_path())?;

        let tracking = TrackingController::new(
            Arc::new(database.clone()),
            Arc::new(LogNotifier),
            || Box::new(SimulatedEstimator::new(StdRandom::from_entropy())) as Box<dyn Estimator>,
            config.cadence,
        );
        tracking.set_camera_permission(config.camera_permission_granted);

        Ok(Self {
            db: database,
            tracking,
            config: config_store,
        })
    }
}

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("eyecare starting up...");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("failed to build tokio runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(track_until_interrupted()) {
        error!("eyecare exited with an error: {err:?}");
        std::process::exit(1);
    }
}

async fn track_until_interrupted() -> Result<()> {
    let state = AppState::initialize(app_data_dir().join("config.json"))?;

    let session = start_tracking(&state).await.map_err(|err| anyhow!(err))?;
    info!(
        "tracking session {} started, press Ctrl+C to stop",
        session.session_id
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    if let Some(summary) = stop_tracking(&state).await.map_err(|err| anyhow!(err))? {
        info!(
            "session {} lasted {:.1} min with {} samples written",
            summary.session_id, summary.duration_minutes, summary.samples_written
        );
    }

    let report = reports::health_report(&state.db, TimeWindow::Today).await?;
    info!("screen time today: {}", report.screen_time);
    info!("{}", report.insights);

    Ok(())
}
