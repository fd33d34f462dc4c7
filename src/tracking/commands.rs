use crate::{
    tracking::{SessionInfo, SessionSummary, TrackingController, TrackingSnapshot},
    AppState,
};

fn controller_from_state(state: &AppState) -> TrackingController {
    state.tracking.clone()
}

pub async fn start_tracking(state: &AppState) -> Result<SessionInfo, String> {
    let controller = controller_from_state(state);
    controller.start().await.map_err(|e| e.to_string())
}

pub async fn stop_tracking(state: &AppState) -> Result<Option<SessionSummary>, String> {
    let controller = controller_from_state(state);
    controller.stop().await.map_err(|e| e.to_string())
}

pub fn get_tracking_snapshot(state: &AppState) -> TrackingSnapshot {
    controller_from_state(state).snapshot()
}

pub fn set_camera_permission(state: &AppState, granted: bool) {
    controller_from_state(state).set_camera_permission(granted);
}
