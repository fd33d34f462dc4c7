//! User preferences: a single row (`id = 1`) edited in place by the settings
//! screen and restored by reset-to-defaults.

use serde::{Deserialize, Serialize};

pub const PREFERENCES_ROW_ID: i64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub drowsiness_detection_enabled: bool,
    pub blink_reminder_enabled: bool,
    pub break_reminder_enabled: bool,
    pub break_interval_minutes: u32,
    pub gaze_control_enabled: bool,
    pub blink_control_enabled: bool,
    /// 1-10
    pub eye_detection_sensitivity: u32,
    /// 0-100
    pub drowsiness_threshold: u32,
    /// blinks per minute
    pub min_healthy_blink_rate: u32,
    pub dark_mode_enabled: bool,
    pub data_collection_enabled: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            drowsiness_detection_enabled: true,
            blink_reminder_enabled: true,
            break_reminder_enabled: true,
            break_interval_minutes: 20,
            gaze_control_enabled: false,
            blink_control_enabled: false,
            eye_detection_sensitivity: 5,
            drowsiness_threshold: 60,
            min_healthy_blink_rate: 15,
            dark_mode_enabled: false,
            data_collection_enabled: true,
        }
    }
}

pub mod validation {
    use super::UserPreferences;
    use anyhow::{bail, Result};

    const MIN_SENSITIVITY: u32 = 1;
    const MAX_SENSITIVITY: u32 = 10;
    const MAX_DROWSINESS_THRESHOLD: u32 = 100;

    pub fn validate_sensitivity(value: u32) -> Result<()> {
        if !(MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&value) {
            bail!("Eye detection sensitivity must be between 1 and 10");
        }
        Ok(())
    }

    pub fn validate_drowsiness_threshold(value: u32) -> Result<()> {
        if value > MAX_DROWSINESS_THRESHOLD {
            bail!("Drowsiness threshold must be between 0 and 100");
        }
        Ok(())
    }

    pub fn validate_preferences(prefs: &UserPreferences) -> Result<()> {
        validate_sensitivity(prefs.eye_detection_sensitivity)?;
        validate_drowsiness_threshold(prefs.drowsiness_threshold)?;

        if prefs.break_interval_minutes == 0 {
            bail!("Break interval must be at least one minute");
        }
        if prefs.min_healthy_blink_rate == 0 {
            bail!("Minimum healthy blink rate must be positive");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::validation::validate_preferences;
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_preferences(&UserPreferences::default()).is_ok());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut prefs = UserPreferences::default();
        prefs.eye_detection_sensitivity = 11;
        assert!(validate_preferences(&prefs).is_err());

        let mut prefs = UserPreferences::default();
        prefs.drowsiness_threshold = 101;
        assert!(validate_preferences(&prefs).is_err());

        let mut prefs = UserPreferences::default();
        prefs.break_interval_minutes = 0;
        assert!(validate_preferences(&prefs).is_err());
    }
}
