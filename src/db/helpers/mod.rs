use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

/// Fixed-width RFC 3339 (millisecond precision, `Z` suffix) so that string
/// comparison in SQL matches chronological order.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} out of range: {value}"))
}

/// Wrap a conversion failure so it can be returned from a `query_map` closure.
pub fn invalid_data(err: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        err.to_string(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formatted_timestamps_sort_chronologically() {
        let whole = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let fractional = whole + chrono::Duration::milliseconds(5);
        let later = whole + chrono::Duration::seconds(1);

        let mut encoded = vec![
            format_datetime(&later),
            format_datetime(&whole),
            format_datetime(&fractional),
        ];
        encoded.sort();

        assert_eq!(
            encoded,
            vec![
                "2026-03-01T08:00:00.000Z",
                "2026-03-01T08:00:00.005Z",
                "2026-03-01T08:00:01.000Z",
            ]
        );
        assert_eq!(parse_datetime(&encoded[1], "ts").unwrap(), fractional);
    }

    #[test]
    fn negative_counts_are_rejected() {
        assert!(to_u32(-1, "breaks_taken").is_err());
        assert_eq!(to_u32(3, "breaks_taken").unwrap(), 3);
    }
}
