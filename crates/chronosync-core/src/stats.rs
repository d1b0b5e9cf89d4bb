//! Statistics aggregation
//!
//! Buckets tasks by day, week, or month around a reference date and sums
//! tracked minutes per tag. Weeks run Sunday through Saturday.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveTime};
use std::collections::BTreeMap;

use crate::error::{ChronoError, Result};
use crate::snapshot::Task;

/// Aggregation bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
}

/// Total tracked minutes for one tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTotal {
    pub name: String,
    pub minutes: i64,
}

/// Minutes between two `HH:MM` times. Negative when the end precedes the
/// start; the tracker does not enforce ordered ranges.
pub fn duration_minutes(start_time: &str, end_time: &str) -> Result<i64> {
    let start = parse_time(start_time)?;
    let end = parse_time(end_time)?;
    Ok((end - start).num_minutes())
}

fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|e| ChronoError::ParseError(format!("invalid time '{}': {}", s, e)))
}

/// Inclusive date range of the bucket containing `reference`
fn bucket_range(period: Period, reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    match period {
        Period::Day => (reference, reference),
        Period::Week => {
            let start = reference
                - Duration::days(reference.weekday().num_days_from_sunday() as i64);
            (start, start + Duration::days(6))
        }
        Period::Month => {
            let start = reference.with_day(1).unwrap_or(reference);
            (start, start + Months::new(1) - Duration::days(1))
        }
    }
}

/// Sum tracked minutes per tag over the bucket containing `reference`.
///
/// Tasks whose date does not parse fall outside every bucket. Results are
/// sorted by descending total, then by tag name for determinism.
pub fn tag_totals(tasks: &[Task], period: Period, reference: NaiveDate) -> Result<Vec<TagTotal>> {
    let (start, end) = bucket_range(period, reference);

    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for task in tasks {
        let Ok(date) = NaiveDate::parse_from_str(&task.date, "%Y-%m-%d") else {
            continue;
        };
        if date < start || date > end {
            continue;
        }

        let minutes = duration_minutes(&task.start_time, &task.end_time)?;
        *totals.entry(task.tag.as_str()).or_insert(0) += minutes;
    }

    let mut result: Vec<TagTotal> = totals
        .into_iter()
        .map(|(name, minutes)| TagTotal {
            name: name.to_string(),
            minutes,
        })
        .collect();
    // BTreeMap iteration is name-ascending; the stable sort keeps that order
    // within equal totals
    result.sort_by(|a, b| b.minutes.cmp(&a.minutes));
    Ok(result)
}
