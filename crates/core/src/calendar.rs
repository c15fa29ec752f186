// crates/core/src/calendar.rs
//! Calendar-day helpers.
//!
//! All day arithmetic is done in UTC on `NaiveDate`. Days cross the wire and
//! the database as ISO `YYYY-MM-DD` strings.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::DecodeError;

pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO `YYYY-MM-DD` day.
pub fn parse_day(s: &str) -> Result<NaiveDate, DecodeError> {
    NaiveDate::parse_from_str(s.trim(), DAY_FORMAT).map_err(|_| DecodeError::InvalidDay(s.to_string()))
}

pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// The UTC calendar day containing a Unix timestamp.
pub fn day_of(timestamp: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

/// Unix timestamp of 00:00:00 UTC on `day`.
pub fn start_of_day(day: NaiveDate) -> i64 {
    day.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Unix timestamp of the last second of `day` (23:59:59 UTC).
pub fn end_of_day(day: NaiveDate) -> i64 {
    start_of_day(day) + 86_399
}

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Bounds of the `days`-long window ending on `today` (inclusive), as days.
pub fn trailing_window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let span = i64::from(days.max(1)) - 1;
    (today - chrono::Duration::days(span), today)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format_roundtrip() {
        let day = parse_day("2024-02-29").unwrap();
        assert_eq!(format_day(day), "2024-02-29");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_day("2024-13-01").is_err());
        assert!(parse_day("yesterday").is_err());
        assert!(parse_day("").is_err());
    }

    #[test]
    fn test_day_of_and_bounds() {
        let day = parse_day("2024-03-10").unwrap();
        let start = start_of_day(day);
        assert_eq!(day_of(start), Some(day));
        assert_eq!(day_of(end_of_day(day)), Some(day));
        assert_eq!(day_of(end_of_day(day) + 1), day.succ_opt());
    }

    #[test]
    fn test_trailing_window() {
        let today = parse_day("2024-03-10").unwrap();
        let (from, to) = trailing_window(today, 7);
        assert_eq!(format_day(from), "2024-03-04");
        assert_eq!(to, today);

        // A zero-day window still covers today.
        let (from, to) = trailing_window(today, 0);
        assert_eq!(from, today);
        assert_eq!(to, today);
    }
}
