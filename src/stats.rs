//! Read-only completion statistics derived from repository queries.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::warn;

use crate::dates;
use crate::error::Result;
use crate::model::Task;
use crate::store::TodoDb;

pub const WEEKLY_BUCKETS: u32 = 4;
pub const MONTHLY_BUCKETS: u32 = 6;

/// One histogram bar: tasks whose bucket date falls in `[start, end]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    /// Integer percentage, 0 when there are no tasks.
    pub completion_percent: u64,
    pub average_completion_days: f64,
    pub on_time_percent: f64,
    pub weekly: Vec<Bucket>,
    pub monthly: Vec<Bucket>,
}

impl StatsReport {
    pub fn compute(db: &TodoDb, today: NaiveDate) -> Result<Self> {
        let total = db.get_total_task_count()?;
        let completed = db.get_completed_tasks_count()?;
        let pending = db.get_pending_tasks_count()?;
        let done = db.get_completed_tasks()?;
        Ok(Self {
            total,
            completed,
            pending,
            completion_percent: completion_percent(completed, total),
            average_completion_days: average_completion_days(&done),
            on_time_percent: on_time_percent(&done),
            weekly: weekly_histogram(&done, today),
            monthly: monthly_histogram(&done, today),
        })
    }
}

pub fn completion_percent(completed: u64, total: u64) -> u64 {
    if total == 0 { 0 } else { completed * 100 / total }
}

/// Mean whole days from creation to completion.
///
/// Tasks with a missing or unreadable timestamp are left out of both the sum
/// and the count. Returns 0 when nothing qualifies.
pub fn average_completion_days(completed: &[Task]) -> f64 {
    let spans: Vec<i64> = completed
        .iter()
        .filter_map(|task| {
            let created = parse_logged(task.id, "created_date", Some(&task.created_date))?;
            let done = parse_logged(task.id, "completed_date", task.completed_date.as_deref())?;
            Some((done - created).num_days().abs())
        })
        .collect();
    if spans.is_empty() {
        return 0.0;
    }
    spans.iter().sum::<i64>() as f64 / spans.len() as f64
}

/// Share of deadline-bearing completed tasks finished by the end of their
/// deadline day, as a percentage. Tasks without a deadline do not count.
pub fn on_time_percent(completed: &[Task]) -> f64 {
    let mut considered = 0u32;
    let mut on_time = 0u32;
    for task in completed {
        let Some(raw_deadline) = task.deadline.as_deref().filter(|d| !d.trim().is_empty()) else {
            continue;
        };
        let Some(raw_done) = task.completed_date.as_deref().filter(|d| !d.trim().is_empty()) else {
            continue;
        };
        let Some(deadline) = dates::parse_deadline(raw_deadline) else {
            warn!(task_id = task.id, deadline = raw_deadline, "unparsable deadline in stats");
            continue;
        };
        let Some(done) = parse_logged(task.id, "completed_date", Some(raw_done)) else {
            continue;
        };
        considered += 1;
        if done <= dates::end_of_day(deadline) {
            on_time += 1;
        }
    }
    if considered == 0 {
        return 0.0;
    }
    f64::from(on_time) / f64::from(considered) * 100.0
}

/// Four seven-day windows starting `today - 21`, `today - 14`, `today - 7`
/// and `today`, oldest first.
pub fn weekly_histogram(completed: &[Task], today: NaiveDate) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = (0..WEEKLY_BUCKETS)
        .rev()
        .map(|i| {
            let start = today - Duration::weeks(i64::from(i));
            Bucket {
                label: dates::format_date(start),
                start,
                end: start + Duration::days(6),
                count: 0,
            }
        })
        .collect();
    fill(&mut buckets, completed);
    buckets
}

/// The current month and the five before it, oldest first.
pub fn monthly_histogram(completed: &[Task], today: NaiveDate) -> Vec<Bucket> {
    let this_month = today.with_day(1).unwrap_or(today);
    let mut buckets: Vec<Bucket> = (0..MONTHLY_BUCKETS)
        .rev()
        .filter_map(|i| {
            let start = this_month.checked_sub_months(Months::new(i))?;
            let end = start.checked_add_months(Months::new(1))? - Duration::days(1);
            Some(Bucket {
                label: start.format("%Y-%m").to_string(),
                start,
                end,
                count: 0,
            })
        })
        .collect();
    fill(&mut buckets, completed);
    buckets
}

/// Count each task into the bucket holding its completion date, or its
/// creation date when no completion date is stored. Dates outside every
/// bucket are dropped.
fn fill(buckets: &mut [Bucket], tasks: &[Task]) {
    for task in tasks {
        let raw = task.completed_date.as_deref().unwrap_or(&task.created_date);
        let Some(at) = parse_logged(task.id, "bucket_date", Some(raw)) else {
            continue;
        };
        let day = at.date();
        if let Some(bucket) = buckets.iter_mut().find(|b| b.start <= day && day <= b.end) {
            bucket.count += 1;
        }
    }
}

fn parse_logged(task_id: i64, field: &str, raw: Option<&str>) -> Option<NaiveDateTime> {
    let raw = raw?;
    let parsed = dates::parse_timestamp(raw);
    if parsed.is_none() {
        warn!(task_id, field, value = raw, "unparsable timestamp in stats");
    }
    parsed
}
