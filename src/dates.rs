//! Timestamp and deadline text handling.
//!
//! Stored dates are plain text. New rows are written as `YYYY-MM-DD HH:MM:SS`
//! local time, but older rows may carry RFC 3339 or the locale-style
//! `Jan 5, 2024 9:03:07 AM` form, so every read goes through the lenient
//! parsers here and returns `None` instead of failing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%b %d, %Y %I:%M:%S %p",
    "%b %d, %Y, %I:%M:%S %p",
];

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse any accepted timestamp form. A bare date maps to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    // Newer JDK locale data separates the AM/PM marker with a narrow no-break space.
    let normalized = raw.trim().replace('\u{202f}', " ");
    if normalized.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(&normalized, DATE_FORMAT)
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Parse the calendar date of a deadline, ignoring any time component.
pub fn parse_deadline(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .ok()
        .or_else(|| parse_timestamp(trimmed).map(|dt| dt.date()))
}

/// 23:59:59 on the given date.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
}

/// Parse an `HH:MM` clock time.
pub fn parse_clock_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}
