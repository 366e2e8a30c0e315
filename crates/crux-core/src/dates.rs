// ABOUTME: Calendar helpers for naive local dates and ISO-second timestamps
// ABOUTME: Week anchoring (this/next Monday), strict and lenient date parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use crate::errors::{AppError, AppResult};
use chrono::{Datelike, Days, Local, NaiveDate};

/// Wire format for every date in the planner
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Wire format for `generated_at` style timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a `YYYY-MM-DD` date
///
/// # Errors
///
/// Returns an `InvalidFormat` error when the value is not a calendar date
pub fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| AppError::invalid_format(format!("Invalid date '{raw}': {e}")))
}

/// Parse the leading `YYYY-MM-DD` of a date or timestamp, ignoring garbage
#[must_use]
pub fn parse_date_lenient(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

/// Today's local date
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Current local time as an ISO timestamp with second precision
#[must_use]
pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Monday of the week containing `date`
#[must_use]
pub fn this_monday(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

/// `date` itself when it is a Monday, otherwise the following Monday
#[must_use]
pub fn next_monday(date: NaiveDate) -> NaiveDate {
    let ahead = (7 - u64::from(date.weekday().num_days_from_monday())) % 7;
    date.checked_add_days(Days::new(ahead)).unwrap_or(date)
}

/// `date + days`, saturating at the calendar bounds
#[must_use]
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    let magnitude = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    };
    shifted.unwrap_or(date)
}

/// Signed whole days `a - b`
#[must_use]
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    a.signed_duration_since(b).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(raw: &str) -> NaiveDate {
        parse_date(raw).unwrap()
    }

    #[test]
    fn test_monday_anchors() {
        // 2026-03-04 is a Wednesday
        assert_eq!(this_monday(d("2026-03-04")), d("2026-03-02"));
        assert_eq!(next_monday(d("2026-03-04")), d("2026-03-09"));
        assert_eq!(next_monday(d("2026-03-02")), d("2026-03-02"));
        assert_eq!(this_monday(d("2026-03-08")), d("2026-03-02"));
    }

    #[test]
    fn test_lenient_parse_accepts_timestamps() {
        assert_eq!(parse_date_lenient("2026-01-06T10:00:00"), Some(d("2026-01-06")));
        assert_eq!(parse_date_lenient("yesterday"), None);
        assert!(parse_date("2026-13-01").is_err());
    }

    #[test]
    fn test_day_arithmetic() {
        assert_eq!(add_days(d("2026-01-06"), 7), d("2026-01-13"));
        assert_eq!(add_days(d("2026-01-06"), -5), d("2026-01-01"));
        assert_eq!(days_between(d("2026-01-13"), d("2026-01-06")), 7);
    }
}
