//! Time arithmetic shared by the pairing, matching and metrics stages.
//!
//! Hour figures are rounded half away from zero, and time-of-day
//! comparisons are made at minute resolution.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::{Decimal, RoundingStrategy};

/// Minutes in a day.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Rounds to two decimal places, half away from zero.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::round2;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round2(Decimal::from_str("8.125").unwrap()), Decimal::from_str("8.13").unwrap());
/// ```
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to one decimal place, half away from zero.
pub fn round1(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Hours from `start` to `end`, rounded to two decimal places.
///
/// Negative when `end` precedes `start`.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::hours_between;
/// use chrono::NaiveDateTime;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let start = NaiveDateTime::parse_from_str("2024-01-15 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let end = NaiveDateTime::parse_from_str("2024-01-15 17:20:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// assert_eq!(hours_between(start, end), Decimal::from_str("8.33").unwrap());
/// ```
pub fn hours_between(start: NaiveDateTime, end: NaiveDateTime) -> Decimal {
    let seconds = (end - start).num_seconds();
    round2(Decimal::from(seconds) / Decimal::from(3600))
}

/// Whole minutes from `start` to `end`, rounded half away from zero.
pub fn minutes_between(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    let seconds = (end - start).num_seconds();
    let minutes = Decimal::from(seconds) / Decimal::from(60);
    minutes
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .try_into()
        .unwrap_or(seconds / 60)
}

/// Minute of the day (0..1440) of a time.
pub fn minute_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour() * 60 + time.minute())
}

/// Minute of the day of a timestamp.
pub fn minute_of_day_at(timestamp: NaiveDateTime) -> i64 {
    minute_of_day(timestamp.time())
}

/// Shortest distance in minutes between two times of day, across midnight.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::circular_minute_distance;
/// use chrono::NaiveTime;
///
/// let a = NaiveTime::from_hms_opt(23, 50, 0).unwrap();
/// let b = NaiveTime::from_hms_opt(0, 10, 0).unwrap();
/// assert_eq!(circular_minute_distance(a, b), 20);
/// ```
pub fn circular_minute_distance(a: NaiveTime, b: NaiveTime) -> i64 {
    let diff = (minute_of_day(a) - minute_of_day(b)).abs();
    diff.min(MINUTES_PER_DAY - diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round2_uses_half_away_from_zero() {
        assert_eq!(round2(dec("0.125")), dec("0.13"));
        assert_eq!(round2(dec("0.135")), dec("0.14"));
        assert_eq!(round1(dec("1.25")), dec("1.3"));
    }

    #[test]
    fn test_hours_between_overnight() {
        let start = make_datetime("2024-01-15", "22:00:00");
        let end = make_datetime("2024-01-16", "06:30:00");
        assert_eq!(hours_between(start, end), dec("8.5"));
    }

    #[test]
    fn test_minutes_between_rounds_seconds() {
        let start = make_datetime("2024-01-15", "09:00:00");
        assert_eq!(minutes_between(start, make_datetime("2024-01-15", "09:10:29")), 10);
        assert_eq!(minutes_between(start, make_datetime("2024-01-15", "09:10:30")), 11);
        assert_eq!(minutes_between(start, make_datetime("2024-01-15", "08:50:00")), -10);
    }

    #[test]
    fn test_circular_distance_is_symmetric() {
        let a = NaiveTime::from_hms_opt(6, 0, 0).unwrap();
        let b = NaiveTime::from_hms_opt(5, 30, 0).unwrap();
        assert_eq!(circular_minute_distance(a, b), 30);
        assert_eq!(circular_minute_distance(b, a), 30);
    }
}
