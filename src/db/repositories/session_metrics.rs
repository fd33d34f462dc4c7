use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

use crate::db::{
    connection::{Database, Table},
    helpers::{format_datetime, invalid_data, parse_datetime, to_u32},
    models::{SessionMetrics, WindowSummary},
    window::TimeRange,
};

use super::blink_samples::query_average_blink_rate;

fn row_to_session_metrics(row: &Row) -> rusqlite::Result<SessionMetrics> {
    let timestamp: String = row.get("timestamp")?;
    let breaks_taken: i64 = row.get("breaks_taken")?;

    Ok(SessionMetrics {
        id: Some(row.get("id")?),
        timestamp: parse_datetime(&timestamp, "timestamp").map_err(invalid_data)?,
        blink_rate: row.get("blink_rate")?,
        drowsiness_level: row.get("drowsiness_level")?,
        session_duration_minutes: row.get("session_duration_minutes")?,
        drowsiness_detected: row.get("drowsiness_detected")?,
        session_id: row.get("session_id")?,
        breaks_taken: to_u32(breaks_taken, "breaks_taken").map_err(invalid_data)?,
        notes: row.get("notes")?,
    })
}

pub(crate) fn query_session_metrics_between(
    conn: &Connection,
    range: TimeRange,
) -> Result<Vec<SessionMetrics>> {
    let mut stmt = conn.prepare(
        "SELECT id, timestamp, blink_rate, drowsiness_level, session_duration_minutes,
                drowsiness_detected, session_id, breaks_taken, notes
         FROM session_metrics
         WHERE timestamp BETWEEN ?1 AND ?2
         ORDER BY timestamp ASC, id ASC",
    )?;

    let metrics = stmt
        .query_map(
            params![format_datetime(&range.start), format_datetime(&range.end)],
            row_to_session_metrics,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(metrics)
}

pub(crate) fn query_window_summary(conn: &Connection, range: TimeRange) -> Result<WindowSummary> {
    let start = format_datetime(&range.start);
    let end = format_datetime(&range.end);

    let drowsy_episodes: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM session_metrics
         WHERE drowsiness_detected = 1 AND timestamp BETWEEN ?1 AND ?2",
        params![start, end],
        |row| row.get(0),
    )?;

    let total_session_minutes: f64 = conn.query_row(
        "SELECT COALESCE(SUM(session_duration_minutes), 0.0)
         FROM session_metrics
         WHERE timestamp BETWEEN ?1 AND ?2",
        params![start, end],
        |row| row.get(0),
    )?;

    Ok(WindowSummary {
        average_blink_rate: query_average_blink_rate(conn, range)?,
        drowsy_episodes: to_u32(drowsy_episodes, "drowsy_episodes")?,
        total_session_minutes,
    })
}

pub(crate) fn write_session_metrics(conn: &Connection, metrics: &SessionMetrics) -> Result<i64> {
    conn.execute(
        "INSERT INTO session_metrics (
            timestamp,
            blink_rate,
            drowsiness_level,
            session_duration_minutes,
            drowsiness_detected,
            session_id,
            breaks_taken,
            notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            format_datetime(&metrics.timestamp),
            metrics.blink_rate,
            metrics.drowsiness_level,
            metrics.session_duration_minutes,
            metrics.drowsiness_detected,
            metrics.session_id,
            i64::from(metrics.breaks_taken),
            metrics.notes,
        ],
    )
    .context("failed to insert session metrics")?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    /// Append a metrics row; returns the new row id.
    pub async fn insert_session_metrics(&self, metrics: &SessionMetrics) -> Result<i64> {
        let record = metrics.clone();
        self.execute_write(&[Table::SessionMetrics], move |conn| {
            write_session_metrics(conn, &record)
        })
        .await
    }

    pub async fn all_session_metrics(&self) -> Result<Vec<SessionMetrics>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, blink_rate, drowsiness_level, session_duration_minutes,
                        drowsiness_detected, session_id, breaks_taken, notes
                 FROM session_metrics
                 ORDER BY timestamp DESC, id DESC",
            )?;

            let metrics = stmt
                .query_map([], row_to_session_metrics)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(metrics)
        })
        .await
    }

    pub async fn session_metrics_between(&self, range: TimeRange) -> Result<Vec<SessionMetrics>> {
        self.execute(move |conn| query_session_metrics_between(conn, range))
            .await
    }

    pub async fn session_metrics_for_session(
        &self,
        session_id: &str,
    ) -> Result<Vec<SessionMetrics>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, blink_rate, drowsiness_level, session_duration_minutes,
                        drowsiness_detected, session_id, breaks_taken, notes
                 FROM session_metrics
                 WHERE session_id = ?1
                 ORDER BY timestamp ASC, id ASC",
            )?;

            let metrics = stmt
                .query_map(params![session_id], row_to_session_metrics)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(metrics)
        })
        .await
    }

    pub async fn count_drowsy_episodes(&self, range: TimeRange) -> Result<u32> {
        Ok(self.window_summary(range).await?.drowsy_episodes)
    }

    /// Sum of session durations (minutes) in the range; 0 when empty.
    pub async fn total_session_minutes(&self, range: TimeRange) -> Result<f64> {
        Ok(self.window_summary(range).await?.total_session_minutes)
    }

    pub async fn window_summary(&self, range: TimeRange) -> Result<WindowSummary> {
        self.execute(move |conn| query_window_summary(conn, range))
            .await
    }

    /// Metrics rows whose drowsiness level exceeded `threshold`.
    pub async fn high_drowsiness_episodes(
        &self,
        threshold: f64,
        range: TimeRange,
    ) -> Result<Vec<SessionMetrics>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, blink_rate, drowsiness_level, session_duration_minutes,
                        drowsiness_detected, session_id, breaks_taken, notes
                 FROM session_metrics
                 WHERE drowsiness_level > ?1 AND timestamp BETWEEN ?2 AND ?3
                 ORDER BY timestamp ASC, id ASC",
            )?;

            let metrics = stmt
                .query_map(
                    params![
                        threshold,
                        format_datetime(&range.start),
                        format_datetime(&range.end)
                    ],
                    row_to_session_metrics,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(metrics)
        })
        .await
    }
}
