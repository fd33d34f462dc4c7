use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimeWindow {
    Today,
    PastWeek,
    PastMonth,
}

/// Inclusive `[start, end]` range used by the window queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Resolve the window against `now`. "Today" starts at local midnight.
    pub fn range_at(self, now: DateTime<Local>) -> TimeRange {
        let start = match self {
            TimeWindow::Today => {
                let midnight = now.date_naive().and_hms_opt(0, 0, 0);
                midnight
                    .and_then(|naive| Local.from_local_datetime(&naive).earliest())
                    .unwrap_or_else(|| now - Duration::hours(24))
            }
            TimeWindow::PastWeek => now - Duration::days(7),
            TimeWindow::PastMonth => now - Duration::days(30),
        };

        TimeRange {
            start: start.with_timezone(&Utc),
            end: now.with_timezone(&Utc),
        }
    }

    pub fn current_range(self) -> TimeRange {
        self.range_at(Local::now())
    }

    /// Phrase used in report text, e.g. "Your average blink rate today ...".
    pub fn phrase(self) -> &'static str {
        match self {
            TimeWindow::Today => "today",
            TimeWindow::PastWeek => "this week",
            TimeWindow::PastMonth => "this month",
        }
    }
}
