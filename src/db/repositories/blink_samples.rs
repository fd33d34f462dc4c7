use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

use crate::db::{
    connection::{Database, Table},
    helpers::{format_datetime, invalid_data, parse_datetime},
    models::BlinkSample,
    window::TimeRange,
};

fn row_to_blink_sample(row: &Row) -> rusqlite::Result<BlinkSample> {
    let timestamp: String = row.get("timestamp")?;

    Ok(BlinkSample {
        id: Some(row.get("id")?),
        timestamp: parse_datetime(&timestamp, "timestamp").map_err(invalid_data)?,
        blink_rate: row.get("blink_rate")?,
        blink_duration_ms: row.get("blink_duration_ms")?,
        session_id: row.get("session_id")?,
        is_low_rate: row.get("is_low_rate")?,
    })
}

pub(crate) fn query_blink_samples_between(
    conn: &Connection,
    range: TimeRange,
) -> Result<Vec<BlinkSample>> {
    let mut stmt = conn.prepare(
        "SELECT id, timestamp, blink_rate, blink_duration_ms, session_id, is_low_rate
         FROM blink_samples
         WHERE timestamp BETWEEN ?1 AND ?2
         ORDER BY timestamp ASC, id ASC",
    )?;

    let samples = stmt
        .query_map(
            params![format_datetime(&range.start), format_datetime(&range.end)],
            row_to_blink_sample,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(samples)
}

pub(crate) fn query_average_blink_rate(conn: &Connection, range: TimeRange) -> Result<f64> {
    let average: f64 = conn.query_row(
        "SELECT COALESCE(AVG(blink_rate), 0.0)
         FROM blink_samples
         WHERE timestamp BETWEEN ?1 AND ?2",
        params![format_datetime(&range.start), format_datetime(&range.end)],
        |row| row.get(0),
    )?;
    Ok(average)
}

pub(crate) fn write_blink_sample(conn: &Connection, sample: &BlinkSample) -> Result<i64> {
    conn.execute(
        "INSERT INTO blink_samples (timestamp, blink_rate, blink_duration_ms, session_id, is_low_rate)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            format_datetime(&sample.timestamp),
            sample.blink_rate,
            sample.blink_duration_ms,
            sample.session_id,
            sample.is_low_rate,
        ],
    )
    .context("failed to insert blink sample")?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    /// Append a sample; returns the new row id.
    pub async fn insert_blink_sample(&self, sample: &BlinkSample) -> Result<i64> {
        let record = sample.clone();
        self.execute_write(&[Table::BlinkSamples], move |conn| {
            write_blink_sample(conn, &record)
        })
        .await
    }

    pub async fn all_blink_samples(&self) -> Result<Vec<BlinkSample>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, blink_rate, blink_duration_ms, session_id, is_low_rate
                 FROM blink_samples
                 ORDER BY timestamp DESC, id DESC",
            )?;

            let samples = stmt
                .query_map([], row_to_blink_sample)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(samples)
        })
        .await
    }

    pub async fn blink_samples_between(&self, range: TimeRange) -> Result<Vec<BlinkSample>> {
        self.execute(move |conn| query_blink_samples_between(conn, range))
            .await
    }

    pub async fn blink_samples_for_session(&self, session_id: &str) -> Result<Vec<BlinkSample>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, blink_rate, blink_duration_ms, session_id, is_low_rate
                 FROM blink_samples
                 WHERE session_id = ?1
                 ORDER BY timestamp ASC, id ASC",
            )?;

            let samples = stmt
                .query_map(params![session_id], row_to_blink_sample)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(samples)
        })
        .await
    }

    /// Average blink rate over the range; 0 when there are no samples.
    pub async fn average_blink_rate(&self, range: TimeRange) -> Result<f64> {
        self.execute(move |conn| query_average_blink_rate(conn, range))
            .await
    }

    /// Samples whose blink rate fell below `threshold`.
    pub async fn low_blink_rate_episodes(
        &self,
        threshold: f64,
        range: TimeRange,
    ) -> Result<Vec<BlinkSample>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, blink_rate, blink_duration_ms, session_id, is_low_rate
                 FROM blink_samples
                 WHERE blink_rate < ?1 AND timestamp BETWEEN ?2 AND ?3
                 ORDER BY timestamp ASC, id ASC",
            )?;

            let samples = stmt
                .query_map(
                    params![
                        threshold,
                        format_datetime(&range.start),
                        format_datetime(&range.end)
                    ],
                    row_to_blink_sample,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(samples)
        })
        .await
    }
}
