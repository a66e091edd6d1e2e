//! Approved leave, OD, overtime and permission facts.
//!
//! The engine never decides approval; these are the already-approved
//! outputs of external workflows.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::YearMonth;

/// An approved leave over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedLeave {
    /// The employee number.
    pub employee_number: String,
    /// First day of leave.
    pub from_date: NaiveDate,
    /// Last day of leave.
    pub to_date: NaiveDate,
    /// Half-day leave counts 0.5 per day.
    #[serde(default)]
    pub is_half_day: bool,
}

impl ApprovedLeave {
    /// Leave days falling inside the given month.
    ///
    /// # Example
    ///
    /// ```
    /// use attendance_engine::models::{ApprovedLeave, YearMonth};
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let leave = ApprovedLeave {
    ///     employee_number: "E001".to_string(),
    ///     from_date: NaiveDate::from_ymd_opt(2024, 1, 30).unwrap(),
    ///     to_date: NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
    ///     is_half_day: false,
    /// };
    /// assert_eq!(leave.days_in(YearMonth::new(2024, 1).unwrap()), Decimal::from(2));
    /// assert_eq!(leave.days_in(YearMonth::new(2024, 2).unwrap()), Decimal::from(2));
    /// ```
    pub fn days_in(&self, month: YearMonth) -> Decimal {
        let per_day = if self.is_half_day {
            Decimal::new(5, 1)
        } else {
            Decimal::ONE
        };
        per_day * Decimal::from(overlap_days(self.from_date, self.to_date, month))
    }

    /// Returns true if the leave covers the date.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.from_date <= date && date <= self.to_date
    }
}

/// The kind of an approved on-duty (OD) entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OdKind {
    /// A whole day on duty away from the workplace.
    FullDay,
    /// Half a day on duty.
    HalfDay,
    /// A number of hours on duty. Never counted as days.
    Hours {
        /// Hours on duty.
        hours: Decimal,
    },
}

/// An approved OD over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedOd {
    /// The employee number.
    pub employee_number: String,
    /// First day of the OD.
    pub from_date: NaiveDate,
    /// Last day of the OD.
    pub to_date: NaiveDate,
    /// Full day, half day or hours.
    pub kind: OdKind,
}

impl ApprovedOd {
    /// OD days inside the given month. Hour-based ODs count zero.
    pub fn days_in(&self, month: YearMonth) -> Decimal {
        let per_day = match self.kind {
            OdKind::FullDay => Decimal::ONE,
            OdKind::HalfDay => Decimal::new(5, 1),
            OdKind::Hours { .. } => return Decimal::ZERO,
        };
        per_day * Decimal::from(overlap_days(self.from_date, self.to_date, month))
    }

    /// Returns true if the OD covers the date.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.from_date <= date && date <= self.to_date
    }
}

/// Approved overtime hours for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedOvertime {
    /// The employee number.
    pub employee_number: String,
    /// The date the overtime was worked.
    pub date: NaiveDate,
    /// Approved hours.
    pub hours: Decimal,
}

/// Approved permission (short absence) hours for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedPermission {
    /// The employee number.
    pub employee_number: String,
    /// The date of the permission.
    pub date: NaiveDate,
    /// Approved hours.
    pub hours: Decimal,
}

fn overlap_days(from: NaiveDate, to: NaiveDate, month: YearMonth) -> i64 {
    let start = from.max(month.first_day());
    let end = to.min(month.last_day());
    if end < start {
        0
    } else {
        (end - start).num_days() + 1
    }
}
