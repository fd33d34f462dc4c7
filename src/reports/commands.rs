use crate::{
    db::TimeWindow,
    reports::{export_window, health_report, HealthReport},
    AppState,
};

pub async fn get_health_report(
    state: &AppState,
    window: TimeWindow,
) -> Result<HealthReport, String> {
    health_report(&state.db, window)
        .await
        .map_err(|e| e.to_string())
}

/// Always produces a message for the user, success or not.
pub async fn export_data(state: &AppState, window: TimeWindow) -> String {
    let dir = state.config.config().resolved_export_dir();
    match export_window(&state.db, window, dir).await {
        Ok(path) => format!("Data exported to {}", path.display()),
        Err(err) => format!("Failed to export data: {err}"),
    }
}
