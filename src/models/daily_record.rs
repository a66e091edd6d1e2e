//! Daily attendance record model.
//!
//! One [`DailyAttendanceRecord`] exists per (employee, calendar date). It is
//! the canonical output of the pairing, matching and metrics stages.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{EarlyOutEvaluation, PunchSource};

/// Attendance status of one employee-day.
///
/// # Example
///
/// ```
/// use attendance_engine::models::AttendanceStatus;
///
/// assert_eq!(AttendanceStatus::HalfDay.to_string(), "HALF_DAY");
/// assert!(AttendanceStatus::Partial.counts_as_present());
/// assert!(!AttendanceStatus::HalfDay.counts_as_present());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    /// Worked a full day.
    Present,
    /// No punches on a working day.
    Absent,
    /// Punched in but never out.
    Partial,
    /// Worked less than the half-day threshold.
    HalfDay,
    /// Rostered holiday.
    Holiday,
    /// Rostered weekly off.
    WeekOff,
}

impl AttendanceStatus {
    /// Present and partial days count towards present days and payable shifts.
    pub fn counts_as_present(&self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Partial)
    }

    /// The upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "PRESENT",
            AttendanceStatus::Absent => "ABSENT",
            AttendanceStatus::Partial => "PARTIAL",
            AttendanceStatus::HalfDay => "HALF_DAY",
            AttendanceStatus::Holiday => "HOLIDAY",
            AttendanceStatus::WeekOff => "WEEK_OFF",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canonical attendance record for one employee on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAttendanceRecord {
    /// The employee number.
    pub employee_number: String,
    /// The shift date (the IN's calendar date for overnight spans).
    pub date: NaiveDate,
    /// First IN of the day.
    pub in_time: Option<NaiveDateTime>,
    /// Paired OUT, possibly on the following calendar day.
    pub out_time: Option<NaiveDateTime>,
    /// Assigned shift ID.
    pub shift_id: Option<String>,
    /// Assigned shift name.
    pub shift_name: Option<String>,
    /// Payable weight of the assigned shift at assignment time.
    pub payable_shifts: Option<Decimal>,
    /// Minutes late past start plus grace.
    pub late_in_minutes: u32,
    /// Minutes left before the shift end.
    pub early_out_minutes: u32,
    /// True when `late_in_minutes > 0`.
    pub is_late_in: bool,
    /// True when `early_out_minutes > 0`.
    pub is_early_out: bool,
    /// Duration of the assigned shift.
    pub expected_hours: Option<Decimal>,
    /// Hours between IN and OUT.
    pub total_hours: Option<Decimal>,
    /// Hours worked past the shift end.
    pub extra_hours: Decimal,
    /// Approved overtime hours for the date.
    pub ot_hours: Decimal,
    /// OD-hours equivalent for the date.
    pub od_hours: Decimal,
    /// Derived day status.
    pub status: AttendanceStatus,
    /// Origins of the punches that built this record.
    pub sources: Vec<PunchSource>,
    /// Manually corrected records are skipped by automatic sync.
    pub locked: bool,
    /// True when the assigned shift differs from the rostered one.
    pub is_roster_deviation: bool,
    /// Free-text notes.
    pub notes: Vec<String>,
    /// Early-out deduction evaluated when the record was last derived.
    pub early_out_deduction: Option<EarlyOutEvaluation>,
}

impl DailyAttendanceRecord {
    /// Creates an empty record with the given status.
    ///
    /// # Example
    ///
    /// ```
    /// use attendance_engine::models::{AttendanceStatus, DailyAttendanceRecord};
    /// use chrono::NaiveDate;
    ///
    /// let record = DailyAttendanceRecord::new(
    ///     "E001",
    ///     NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
    ///     AttendanceStatus::Absent,
    /// );
    /// assert!(record.in_time.is_none());
    /// assert!(!record.locked);
    /// ```
    pub fn new(employee_number: impl Into<String>, date: NaiveDate, status: AttendanceStatus) -> Self {
        Self {
            employee_number: employee_number.into(),
            date,
            in_time: None,
            out_time: None,
            shift_id: None,
            shift_name: None,
            payable_shifts: None,
            late_in_minutes: 0,
            early_out_minutes: 0,
            is_late_in: false,
            is_early_out: false,
            expected_hours: None,
            total_hours: None,
            extra_hours: Decimal::ZERO,
            ot_hours: Decimal::ZERO,
            od_hours: Decimal::ZERO,
            status,
            sources: Vec::new(),
            locked: false,
            is_roster_deviation: false,
            notes: Vec::new(),
            early_out_deduction: None,
        }
    }

    /// Appends a note unless it is already present.
    pub fn add_note(&mut self, note: &str) {
        if !self.notes.iter().any(|n| n == note) {
            self.notes.push(note.to_string());
        }
    }

    /// Clears the shift assignment and its derived minutes.
    pub fn clear_shift(&mut self) {
        self.shift_id = None;
        self.shift_name = None;
        self.payable_shifts = None;
        self.late_in_minutes = 0;
        self.early_out_minutes = 0;
        self.is_late_in = false;
        self.is_early_out = false;
        self.expected_hours = None;
        self.is_roster_deviation = false;
    }

    /// Merges punch sources, keeping them sorted and unique.
    pub fn merge_sources(&mut self, sources: &[PunchSource]) {
        self.sources.extend_from_slice(sources);
        self.sources.sort();
        self.sources.dedup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_add_note_is_idempotent() {
        let mut record = DailyAttendanceRecord::new("E001", date(), AttendanceStatus::WeekOff);
        record.add_note("Worked on Week Off");
        record.add_note("Worked on Week Off");
        assert_eq!(record.notes, vec!["Worked on Week Off".to_string()]);
    }

    #[test]
    fn test_merge_sources_sorts_and_dedups() {
        let mut record = DailyAttendanceRecord::new("E001", date(), AttendanceStatus::Present);
        record.merge_sources(&[PunchSource::Manual, PunchSource::Device]);
        record.merge_sources(&[PunchSource::Device]);
        assert_eq!(record.sources, vec![PunchSource::Device, PunchSource::Manual]);
    }

    #[test]
    fn test_status_serializes_as_wire_name() {
        let json = serde_json::to_string(&AttendanceStatus::WeekOff).unwrap();
        assert_eq!(json, "\"WEEK_OFF\"");
        let parsed: AttendanceStatus = serde_json::from_str("\"HALF_DAY\"").unwrap();
        assert_eq!(parsed, AttendanceStatus::HalfDay);
    }
}
