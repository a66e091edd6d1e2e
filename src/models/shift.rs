//! Shift catalog models.
//!
//! This module defines the reference data the matcher works against:
//! shift definitions, roster overrides and employee profiles.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Represents a shift definition with its daily window.
///
/// The end time may be earlier than (or equal to) the start time, in which
/// case the shift wraps past midnight and ends on the following day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftDefinition {
    /// Unique identifier for the shift.
    pub id: String,
    /// Human-readable name, e.g. "General".
    pub name: String,
    /// Time of day the shift starts.
    #[serde(with = "time_of_day")]
    pub start_time: NaiveTime,
    /// Time of day the shift ends.
    #[serde(with = "time_of_day")]
    pub end_time: NaiveTime,
    /// Explicit duration in hours; derived from start/end when absent.
    #[serde(default)]
    pub duration_hours: Option<Decimal>,
    /// Grace period in minutes; the configured default applies when absent.
    #[serde(default)]
    pub grace_period_minutes: Option<u32>,
    /// Payable weight of one worked day on this shift.
    #[serde(default = "default_payable_shifts")]
    pub payable_shifts: Decimal,
    /// Inactive shifts are never match candidates.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_payable_shifts() -> Decimal {
    Decimal::ONE
}

fn default_active() -> bool {
    true
}

impl ShiftDefinition {
    /// Returns true if the shift ends on the day after it starts.
    pub fn is_overnight(&self) -> bool {
        self.end_time <= self.start_time
    }

    /// Returns the shift duration in hours.
    ///
    /// Uses the explicit duration when configured, otherwise the span from
    /// start to end (adding 24 hours for overnight shifts), rounded to two
    /// decimal places.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::ShiftDefinition;
    /// use chrono::NaiveTime;
    /// use rust_decimal::Decimal;
    ///
    /// let night = ShiftDefinition {
    ///     id: "NIGHT".to_string(),
    ///     name: "Night".to_string(),
    ///     start_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
    ///     end_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
    ///     duration_hours: None,
    ///     grace_period_minutes: None,
    ///     payable_shifts: Decimal::ONE,
    ///     is_active: true,
    /// };
    /// assert_eq!(night.duration(), Decimal::new(8, 0));
    /// ```
    pub fn duration(&self) -> Decimal {
        if let Some(hours) = self.duration_hours {
            return hours;
        }

        let start = minutes_of(self.start_time);
        let mut end = minutes_of(self.end_time);
        if end <= start {
            end += 24 * 60;
        }

        (Decimal::from(end - start) / Decimal::from(60))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Grace period for this shift, falling back to `default_minutes`.
    pub fn grace_minutes(&self, default_minutes: u32) -> u32 {
        self.grace_period_minutes.unwrap_or(default_minutes)
    }

    /// The shift start on the given shift date.
    pub fn start_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.start_time)
    }

    /// The shift end for a shift that starts on the given date.
    pub fn end_on(&self, date: NaiveDate) -> NaiveDateTime {
        if self.is_overnight() {
            date.succ_opt().unwrap_or(date).and_time(self.end_time)
        } else {
            date.and_time(self.end_time)
        }
    }
}

fn minutes_of(time: NaiveTime) -> i64 {
    i64::from(time.hour() * 60 + time.minute())
}

/// What a roster override says about one employee-day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RosterAssignment {
    /// The employee is rostered onto a specific shift.
    Shift {
        /// The rostered shift.
        shift_id: String,
    },
    /// Weekly off day.
    WeekOff,
    /// Holiday.
    Holiday,
}

/// A non-working roster marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonWorkingDay {
    /// Weekly off day.
    WeekOff,
    /// Holiday.
    Holiday,
}

impl NonWorkingDay {
    /// Note appended to a record when the employee punched on this day.
    pub fn worked_note(&self) -> &'static str {
        match self {
            NonWorkingDay::WeekOff => "Worked on Week Off",
            NonWorkingDay::Holiday => "Worked on Holiday",
        }
    }
}

/// A roster override for one employee on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// The employee number.
    pub employee_number: String,
    /// The rostered date.
    pub date: NaiveDate,
    /// The rostered shift or non-working marker.
    pub assignment: RosterAssignment,
}

/// The slice of an employee master record the engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    /// Normalised employee number.
    pub employee_number: String,
    /// Department code, if any.
    #[serde(default)]
    pub department: Option<String>,
    /// Designation code, if any.
    #[serde(default)]
    pub designation: Option<String>,
    /// Inactive employees are skipped by batch runs.
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Serde helpers for "HH:MM" times of day.
mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&text, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&text, "%H:%M:%S"))
            .map_err(|e| serde::de::Error::custom(format!("invalid time '{}': {}", text, e)))
    }
}
