use std::collections::BTreeMap;

use chrono::{Datelike, TimeZone, Timelike};
use serde::Serialize;

use crate::db::{BlinkSample, TimeWindow};

const MAX_DAILY_POINTS: usize = 6;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    pub label: String,
    pub blink_rate: f64,
}

/// Average blink rate per bucket: hours for today, weekdays for the past
/// week, weeks of the month for the past month. Buckets use `tz` local time.
pub fn blink_timeline<Tz: TimeZone>(
    window: TimeWindow,
    samples: &[BlinkSample],
    tz: &Tz,
) -> Vec<TimelinePoint> {
    let bucket_of = |sample: &BlinkSample| {
        let local = sample.timestamp.with_timezone(tz);
        match window {
            TimeWindow::Today => local.hour(),
            TimeWindow::PastWeek => local.weekday().num_days_from_sunday(),
            TimeWindow::PastMonth => {
                let first_weekday = local
                    .with_day(1)
                    .map(|first| first.weekday().num_days_from_sunday())
                    .unwrap_or(0);
                week_of_month(local.day(), first_weekday)
            }
        }
    };

    let mut buckets: BTreeMap<u32, (f64, u32)> = BTreeMap::new();
    for sample in samples {
        let entry = buckets.entry(bucket_of(sample)).or_insert((0.0, 0));
        entry.0 += sample.blink_rate;
        entry.1 += 1;
    }

    if buckets.is_empty() {
        return placeholder(window);
    }

    let averages = buckets
        .into_iter()
        .map(|(bucket, (sum, count))| (bucket, sum / f64::from(count)));

    match window {
        TimeWindow::Today => {
            let hourly: Vec<_> = averages.collect();
            let step = (hourly.len() / MAX_DAILY_POINTS).max(1);
            hourly
                .into_iter()
                .step_by(step)
                .take(MAX_DAILY_POINTS)
                .map(|(hour, rate)| point(hour_label(hour), rate))
                .collect()
        }
        TimeWindow::PastWeek => averages
            .map(|(day, rate)| point(day_label(day).to_string(), rate))
            .collect(),
        TimeWindow::PastMonth => averages
            .map(|(week, rate)| point(format!("Week {week}"), rate))
            .collect(),
    }
}

fn placeholder(window: TimeWindow) -> Vec<TimelinePoint> {
    let labels: Vec<String> = match window {
        TimeWindow::Today => ["8 AM", "10 AM", "12 PM", "2 PM", "4 PM", "6 PM"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        TimeWindow::PastWeek => ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        TimeWindow::PastMonth => (1..=6).map(|week| format!("Week {week}")).collect(),
    };
    labels.into_iter().map(|label| point(label, 0.0)).collect()
}

fn point(label: String, blink_rate: f64) -> TimelinePoint {
    TimelinePoint { label, blink_rate }
}

/// Sunday-first week number, 1-based. `first_weekday` is the weekday of the
/// 1st counted from Sunday.
fn week_of_month(day: u32, first_weekday: u32) -> u32 {
    (day - 1 + first_weekday) / 7 + 1
}

fn hour_label(hour: u32) -> String {
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{display} {suffix}")
}

fn day_label(day_from_sunday: u32) -> &'static str {
    match day_from_sunday {
        0 => "Sun",
        1 => "Mon",
        2 => "Tue",
        3 => "Wed",
        4 => "Thu",
        5 => "Fri",
        _ => "Sat",
    }
}
