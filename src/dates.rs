//! Calendar-date helpers.
//!
//! Dates travel through the planner as `YYYY-MM-DD` strings. Parsing is
//! strict: the string must be zero-padded and name a real calendar day.

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::LazyLock;

/// Timezone used until a caller configures another one.
pub const DEFAULT_TIME_ZONE: &str = "America/New_York";

static YMD_PATTERN: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static YMD pattern compiles")
});

/// Check the `YYYY-MM-DD` shape only. `2025-13-01` passes; use [`parse_ymd`] for validity.
pub fn is_ymd_string(value: &str) -> bool {
    YMD_PATTERN.is_match(value)
}

/// Parse a zero-padded `YYYY-MM-DD` string into a real calendar date.
pub fn parse_ymd(value: &str) -> Option<NaiveDate> {
    if !is_ymd_string(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_ymd(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Shift a date by a signed number of days, saturating at chrono's range.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

/// Signed number of calendar days from `a` to `b`.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    b.signed_duration_since(a).num_days()
}

/// Parse an IANA timezone identifier.
pub fn parse_time_zone(id: &str) -> Option<Tz> {
    id.trim().parse::<Tz>().ok()
}

/// Calendar date of `now` in the timezone `tz`.
///
/// An unknown identifier falls back to the host's local calendar date.
pub fn today_in(tz: &str, now: DateTime<Utc>) -> NaiveDate {
    match parse_time_zone(tz) {
        Some(zone) => now.with_timezone(&zone).date_naive(),
        None => {
            tracing::debug!(time_zone = %tz, "Unknown timezone, using local date");
            now.with_timezone(&Local).date_naive()
        }
    }
}

/// `today_in` formatted as a YMD string.
pub fn today_ymd_in(tz: &str, now: DateTime<Utc>) -> String {
    format_ymd(today_in(tz, now))
}

/// Sunday-to-Saturday week containing today in `tz`, as `(from, to)` YMD strings.
pub fn week_range_from_today(tz: &str, now: DateTime<Utc>) -> (String, String) {
    let today = today_in(tz, now);
    let offset = today.weekday().num_days_from_sunday() as i64;
    let sunday = add_days(today, -offset);
    let saturday = add_days(sunday, 6);
    (format_ymd(sunday), format_ymd(saturday))
}

/// December 31st of the year `now` falls in (host local time).
pub fn end_of_year_ymd(now: DateTime<Utc>) -> String {
    format!("{}-12-31", now.with_timezone(&Local).year())
}

/// December 31st of the current year.
pub fn end_of_current_year_ymd() -> String {
    end_of_year_ymd(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_is_ymd_string_checks_shape_only() {
        assert!(is_ymd_string("2025-09-15"));
        assert!(is_ymd_string("2024-02-29"));
        assert!(is_ymd_string("2025-13-01"));
        assert!(!is_ymd_string("2025-9-15"));
        assert!(!is_ymd_string("25-09-15"));
        assert!(!is_ymd_string("2025/09/15"));
        assert!(!is_ymd_string(""));
    }

    #[test]
    fn test_parse_ymd_rejects_impossible_dates() {
        assert_eq!(parse_ymd("2024-02-29"), Some(ymd(2024, 2, 29)));
        assert_eq!(parse_ymd("2025-02-29"), None);
        assert_eq!(parse_ymd("2025-13-01"), None);
        assert_eq!(parse_ymd("2025-6-1"), None);
        assert_eq!(parse_ymd("garbage"), None);
    }

    #[test]
    fn test_days_between_crosses_boundaries() {
        assert_eq!(days_between(ymd(2025, 9, 15), ymd(2025, 9, 20)), 5);
        assert_eq!(days_between(ymd(2025, 9, 20), ymd(2025, 9, 15)), -5);
        assert_eq!(days_between(ymd(2025, 8, 31), ymd(2025, 9, 1)), 1);
        assert_eq!(days_between(ymd(2024, 12, 31), ymd(2025, 1, 1)), 1);
    }

    #[test]
    fn test_add_days() {
        assert_eq!(add_days(ymd(2025, 6, 28), 7), ymd(2025, 7, 5));
        assert_eq!(add_days(ymd(2025, 3, 1), -1), ymd(2025, 2, 28));
    }

    #[test]
    fn test_today_in_respects_time_zone() {
        // 02:00 UTC is still the previous evening in New York.
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 2, 0, 0).unwrap();
        assert_eq!(today_ymd_in("America/New_York", now), "2025-06-14");
        assert_eq!(today_ymd_in("UTC", now), "2025-06-15");
        assert_eq!(today_ymd_in("Asia/Tokyo", now), "2025-06-15");
    }

    #[test]
    fn test_today_in_unknown_zone_falls_back() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let today = today_ymd_in("Not/AZone", now);
        assert!(parse_ymd(&today).is_some());
    }

    #[test]
    fn test_week_range_from_today() {
        // 2025-09-17 is a Wednesday.
        let now = Utc.with_ymd_and_hms(2025, 9, 17, 12, 0, 0).unwrap();
        let (from, to) = week_range_from_today("UTC", now);
        assert_eq!(from, "2025-09-14");
        assert_eq!(to, "2025-09-20");
    }

    #[test]
    fn test_end_of_year_ymd() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(end_of_year_ymd(now), "2025-12-31");
    }
}
