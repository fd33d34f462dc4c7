//! Commands for the settings screen.

use crate::{db::UserPreferences, AppState};

pub async fn get_user_preferences(state: &AppState) -> Result<UserPreferences, String> {
    state
        .db
        .get_user_preferences()
        .await
        .map_err(|e| e.to_string())
}

pub async fn update_user_preferences(
    state: &AppState,
    preferences: UserPreferences,
) -> Result<UserPreferences, String> {
    state
        .db
        .upsert_user_preferences(preferences)
        .await
        .map_err(|e| e.to_string())
}

pub async fn reset_user_preferences(state: &AppState) -> Result<UserPreferences, String> {
    state
        .db
        .reset_user_preferences()
        .await
        .map_err(|e| e.to_string())
}
