use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};

use crate::db::SessionMetrics;

const CSV_HEADER: &str =
    "Timestamp,Blink Rate,Drowsiness Level,Session Duration,Drowsiness Detected";

pub fn export_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("eye_health_data_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Writes `metrics` as CSV into `dir` and returns the final path. The file
/// only appears under its final name once fully written.
pub fn export_session_metrics(
    metrics: &[SessionMetrics],
    dir: &Path,
    now: DateTime<Local>,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;

    let path = dir.join(export_file_name(&now));
    let partial = path.with_extension("csv.part");

    if let Err(err) = write_csv(metrics, &partial, &Local) {
        let _ = fs::remove_file(&partial);
        return Err(err);
    }

    if let Err(err) = fs::rename(&partial, &path) {
        let _ = fs::remove_file(&partial);
        return Err(anyhow::Error::new(err)
            .context(format!("failed to move export into place at {}", path.display())));
    }

    Ok(path)
}

fn write_csv<Tz: TimeZone>(metrics: &[SessionMetrics], path: &Path, tz: &Tz) -> Result<()>
where
    Tz::Offset: std::fmt::Display,
{
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{CSV_HEADER}")?;
    for row in metrics {
        writeln!(writer, "{}", csv_line(row, tz))?;
    }

    writer.flush().context("failed to flush export")?;
    Ok(())
}

fn csv_line<Tz: TimeZone>(row: &SessionMetrics, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{},{},{},{},{}",
        row.timestamp.with_timezone(tz).format("%Y-%m-%d %H:%M:%S"),
        row.blink_rate,
        row.drowsiness_level,
        row.session_duration_minutes,
        row.drowsiness_detected,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn metrics(rfc3339: &str, drowsy: bool) -> SessionMetrics {
        SessionMetrics {
            id: None,
            timestamp: DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc),
            blink_rate: 12.5,
            drowsiness_level: 40.0,
            session_duration_minutes: 1.5,
            drowsiness_detected: drowsy,
            session_id: "s".into(),
            breaks_taken: 0,
            notes: String::new(),
        }
    }

    #[test]
    fn line_uses_local_timestamp_format() {
        let row = metrics("2026-03-04T09:05:07.250Z", true);
        assert_eq!(csv_line(&row, &Utc), "2026-03-04 09:05:07,12.5,40,1.5,true");
    }

    #[test]
    fn file_name_is_timestamped() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 9, 5, 7).unwrap();
        assert_eq!(export_file_name(&now), "eye_health_data_20260304_090507.csv");
    }

    #[test]
    fn writes_header_and_rows_and_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let rows = [
            metrics("2026-03-04T09:00:00Z", false),
            metrics("2026-03-04T09:00:05Z", true),
        ];

        let path = export_session_metrics(&rows, dir.path(), Local::now()).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[2].ends_with(",true"));

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn empty_export_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_session_metrics(&[], &dir.path().join("nested"), Local::now()).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), format!("{CSV_HEADER}\n"));
    }

    #[test]
    fn unwritable_directory_reports_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        fs::write(&blocker, "not a directory").unwrap();

        assert!(export_session_metrics(&[], &blocker, Local::now()).is_err());
    }

    #[test]
    fn failed_move_into_place_removes_the_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let now = Local.with_ymd_and_hms(2026, 3, 4, 9, 5, 7).unwrap();
        let taken = dir.path().join(export_file_name(&now));
        fs::create_dir(&taken).unwrap();
        fs::write(taken.join("keep"), "occupied").unwrap();

        let rows = [metrics("2026-03-04T09:00:00Z", false)];
        let err = export_session_metrics(&rows, dir.path(), now).unwrap_err();
        assert!(format!("{err:#}").contains("failed to move export into place"));

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![export_file_name(&now)]);
        assert!(!names.iter().any(|name| name.ends_with(".csv.part")));
    }
}
