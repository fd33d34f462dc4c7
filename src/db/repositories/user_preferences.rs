use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    connection::{Database, Table},
    helpers::{format_datetime, invalid_data, to_u32},
    models::{
        user_preferences::{validation, PREFERENCES_ROW_ID},
        UserPreferences,
    },
};

fn row_to_preferences(row: &Row) -> rusqlite::Result<UserPreferences> {
    let count = |field: &str| -> rusqlite::Result<u32> {
        let raw: i64 = row.get(field)?;
        to_u32(raw, field).map_err(invalid_data)
    };

    Ok(UserPreferences {
        drowsiness_detection_enabled: row.get("drowsiness_detection_enabled")?,
        blink_reminder_enabled: row.get("blink_reminder_enabled")?,
        break_reminder_enabled: row.get("break_reminder_enabled")?,
        break_interval_minutes: count("break_interval_minutes")?,
        gaze_control_enabled: row.get("gaze_control_enabled")?,
        blink_control_enabled: row.get("blink_control_enabled")?,
        eye_detection_sensitivity: count("eye_detection_sensitivity")?,
        drowsiness_threshold: count("drowsiness_threshold")?,
        min_healthy_blink_rate: count("min_healthy_blink_rate")?,
        dark_mode_enabled: row.get("dark_mode_enabled")?,
        data_collection_enabled: row.get("data_collection_enabled")?,
    })
}

/// Current preferences, or the defaults when the row is missing.
pub(crate) fn query_user_preferences(conn: &Connection) -> Result<UserPreferences> {
    let mut stmt = conn.prepare(
        "SELECT drowsiness_detection_enabled, blink_reminder_enabled, break_reminder_enabled,
                break_interval_minutes, gaze_control_enabled, blink_control_enabled,
                eye_detection_sensitivity, drowsiness_threshold, min_healthy_blink_rate,
                dark_mode_enabled, data_collection_enabled
         FROM user_preferences
         WHERE id = ?1",
    )?;

    let prefs = stmt
        .query_row(params![PREFERENCES_ROW_ID], row_to_preferences)
        .optional()?;

    Ok(prefs.unwrap_or_default())
}

fn write_preferences(conn: &Connection, prefs: &UserPreferences) -> Result<()> {
    conn.execute(
        "INSERT INTO user_preferences (
            id,
            drowsiness_detection_enabled,
            blink_reminder_enabled,
            break_reminder_enabled,
            break_interval_minutes,
            gaze_control_enabled,
            blink_control_enabled,
            eye_detection_sensitivity,
            drowsiness_threshold,
            min_healthy_blink_rate,
            dark_mode_enabled,
            data_collection_enabled,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        ON CONFLICT(id) DO UPDATE SET
            drowsiness_detection_enabled = excluded.drowsiness_detection_enabled,
            blink_reminder_enabled = excluded.blink_reminder_enabled,
            break_reminder_enabled = excluded.break_reminder_enabled,
            break_interval_minutes = excluded.break_interval_minutes,
            gaze_control_enabled = excluded.gaze_control_enabled,
            blink_control_enabled = excluded.blink_control_enabled,
            eye_detection_sensitivity = excluded.eye_detection_sensitivity,
            drowsiness_threshold = excluded.drowsiness_threshold,
            min_healthy_blink_rate = excluded.min_healthy_blink_rate,
            dark_mode_enabled = excluded.dark_mode_enabled,
            data_collection_enabled = excluded.data_collection_enabled,
            updated_at = excluded.updated_at",
        params![
            PREFERENCES_ROW_ID,
            prefs.drowsiness_detection_enabled,
            prefs.blink_reminder_enabled,
            prefs.break_reminder_enabled,
            i64::from(prefs.break_interval_minutes),
            prefs.gaze_control_enabled,
            prefs.blink_control_enabled,
            i64::from(prefs.eye_detection_sensitivity),
            i64::from(prefs.drowsiness_threshold),
            i64::from(prefs.min_healthy_blink_rate),
            prefs.dark_mode_enabled,
            prefs.data_collection_enabled,
            format_datetime(&Utc::now()),
        ],
    )?;
    Ok(())
}

impl Database {
    pub async fn get_user_preferences(&self) -> Result<UserPreferences> {
        self.execute(|conn| query_user_preferences(conn)).await
    }

    /// Validate and store `prefs` in the singleton row.
    pub async fn upsert_user_preferences(&self, prefs: UserPreferences) -> Result<UserPreferences> {
        validation::validate_preferences(&prefs)?;

        self.execute_write(&[Table::UserPreferences], move |conn| {
            write_preferences(conn, &prefs).context("failed to upsert user preferences")?;
            query_user_preferences(conn)
        })
        .await
    }

    /// Replace whatever is stored with the defaults, leaving exactly one row.
    pub async fn reset_user_preferences(&self) -> Result<UserPreferences> {
        self.execute_write(&[Table::UserPreferences], |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM user_preferences", [])?;
            write_preferences(&tx, &UserPreferences::default())
                .context("failed to write default preferences")?;
            tx.commit()?;
            query_user_preferences(conn)
        })
        .await
    }
}
