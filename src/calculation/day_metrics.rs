//! Day metrics.
//!
//! This module derives total hours, extra hours and the day status of a
//! daily record once its times and shift are known. It is re-run after
//! every change to the IN, the OUT or the assigned shift, so a stale
//! overflow never survives a reassignment.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::config::MetricsConfig;
use crate::models::{
    ApprovedOd, AttendanceStatus, DailyAttendanceRecord, DerivationStep, NonWorkingDay, OdKind,
};

use super::time_math::{hours_between, round2};

/// Inputs to the metrics calculation for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayMetricsInput {
    /// The day's IN.
    pub in_time: Option<NaiveDateTime>,
    /// The day's OUT.
    pub out_time: Option<NaiveDateTime>,
    /// Expected hours of the assigned shift.
    pub expected_hours: Option<Decimal>,
    /// End instant of the assigned shift.
    pub shift_end: Option<NaiveDateTime>,
    /// Approved overtime hours for the date.
    pub ot_hours: Decimal,
    /// OD-hours equivalent for the date.
    pub od_hours: Decimal,
    /// Roster marker when the day is non-working.
    pub non_working: Option<NonWorkingDay>,
}

impl DayMetricsInput {
    /// Builds the input from a record's current state.
    pub fn from_record(
        record: &DailyAttendanceRecord,
        shift_end: Option<NaiveDateTime>,
        non_working: Option<NonWorkingDay>,
    ) -> Self {
        Self {
            in_time: record.in_time,
            out_time: record.out_time,
            expected_hours: record.expected_hours,
            shift_end,
            ot_hours: record.ot_hours,
            od_hours: record.od_hours,
            non_working,
        }
    }
}

/// Derived metrics for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayMetrics {
    /// Worked hours, when both times exist.
    pub total_hours: Option<Decimal>,
    /// Overflow past the shift end.
    pub extra_hours: Decimal,
    /// Day status.
    pub status: AttendanceStatus,
    /// Note to append to the record, if any.
    pub note: Option<&'static str>,
}

impl DayMetrics {
    /// Writes the metrics onto a record.
    pub fn apply_to(&self, record: &mut DailyAttendanceRecord) {
        record.total_hours = self.total_hours;
        record.extra_hours = self.extra_hours;
        record.status = self.status;
        if let Some(note) = self.note {
            record.add_note(note);
        }
    }
}

/// Result of a metrics calculation, with its derivation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayMetricsResult {
    /// The derived metrics.
    pub metrics: DayMetrics,
    /// The step recording the status decision.
    pub audit_step: DerivationStep,
}

/// Calculates the metrics for one day.
///
/// # Arguments
///
/// * `input` - The day's times, shift and external hours
/// * `config` - Metrics settings carrying the half-day threshold
/// * `step_number` - The step number for derivation trace sequencing
///
/// # Returns
///
/// A [`DayMetricsResult`] where:
/// - `total_hours` is OUT minus IN, only when both exist
/// - `extra_hours` is the overflow past the shift end, zero when approved
///   overtime exists
/// - `status` is the roster marker on a non-working day, ABSENT without an
///   IN, PARTIAL without an OUT, PRESENT without expected hours, and
///   otherwise HALF_DAY when worked plus OD hours fall below the threshold
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::{calculate_day_metrics, DayMetricsInput};
/// use attendance_engine::config::MetricsConfig;
/// use attendance_engine::models::AttendanceStatus;
/// use chrono::NaiveDateTime;
/// use rust_decimal::Decimal;
///
/// let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap();
/// let input = DayMetricsInput {
///     in_time: Some(at("2024-01-15 09:00:00")),
///     out_time: Some(at("2024-01-15 18:45:00")),
///     expected_hours: Some(Decimal::from(9)),
///     shift_end: Some(at("2024-01-15 18:00:00")),
///     ot_hours: Decimal::ZERO,
///     od_hours: Decimal::ZERO,
///     non_working: None,
/// };
///
/// let result = calculate_day_metrics(&input, &MetricsConfig::default(), 2);
/// assert_eq!(result.metrics.status, AttendanceStatus::Present);
/// assert_eq!(result.metrics.extra_hours, Decimal::new(75, 2));
/// ```
pub fn calculate_day_metrics(
    input: &DayMetricsInput,
    config: &MetricsConfig,
    step_number: u32,
) -> DayMetricsResult {
    let total_hours = match (input.in_time, input.out_time) {
        (Some(in_time), Some(out_time)) => Some(hours_between(in_time, out_time)),
        _ => None,
    };

    let overflow = match (input.out_time, input.shift_end) {
        (Some(out_time), Some(end)) if out_time > end => hours_between(end, out_time),
        _ => Decimal::ZERO,
    };
    let extra_hours = if input.ot_hours > Decimal::ZERO {
        Decimal::ZERO
    } else {
        round2(overflow)
    };

    let threshold = input
        .expected_hours
        .filter(|h| *h > Decimal::ZERO)
        .map(|h| round2(h * config.half_day_threshold_ratio));
    let worked = total_hours.unwrap_or(Decimal::ZERO) + input.od_hours;

    let (status, note, reasoning) = match input.non_working {
        Some(day) => {
            let status = match day {
                NonWorkingDay::WeekOff => AttendanceStatus::WeekOff,
                NonWorkingDay::Holiday => AttendanceStatus::Holiday,
            };
            let note = input.in_time.map(|_| day.worked_note());
            (status, note, format!("Roster marks the day as {}", status))
        }
        None if input.in_time.is_none() => (
            AttendanceStatus::Absent,
            None,
            "No in-time recorded".to_string(),
        ),
        None if input.out_time.is_none() => (
            AttendanceStatus::Partial,
            None,
            "No out-time recorded".to_string(),
        ),
        None => match threshold {
            None => (
                AttendanceStatus::Present,
                None,
                "No expected hours to compare against".to_string(),
            ),
            Some(threshold) if worked < threshold => (
                AttendanceStatus::HalfDay,
                None,
                format!(
                    "{} worked + OD hours below {} ({} of expected)",
                    worked.normalize(),
                    threshold.normalize(),
                    config.half_day_threshold_ratio.normalize()
                ),
            ),
            Some(threshold) => (
                AttendanceStatus::Present,
                None,
                format!(
                    "{} worked + OD hours meet {} ({} of expected)",
                    worked.normalize(),
                    threshold.normalize(),
                    config.half_day_threshold_ratio.normalize()
                ),
            ),
        },
    };

    let audit_step = DerivationStep {
        step_number,
        rule_id: "day_metrics".to_string(),
        rule_name: "Day Metrics".to_string(),
        input: serde_json::json!({
            "in_time": input.in_time.map(|t| t.to_string()),
            "out_time": input.out_time.map(|t| t.to_string()),
            "expected_hours": input.expected_hours.map(|h| h.normalize().to_string()),
            "shift_end": input.shift_end.map(|t| t.to_string()),
            "ot_hours": input.ot_hours.normalize().to_string(),
            "od_hours": input.od_hours.normalize().to_string(),
        }),
        output: serde_json::json!({
            "total_hours": total_hours.map(|h| h.normalize().to_string()),
            "extra_hours": extra_hours.normalize().to_string(),
            "status": status,
        }),
        reasoning,
    };

    DayMetricsResult {
        metrics: DayMetrics {
            total_hours,
            extra_hours,
            status,
            note,
        },
        audit_step,
    }
}

/// OD-hours equivalent for an employee on a date.
///
/// Hour-based ODs contribute their hours, half-day ODs the configured
/// half-day hours and full-day ODs the configured full-day hours. Several
/// ODs on the same date add up.
pub fn od_hours_for_date(ods: &[ApprovedOd], date: NaiveDate, config: &MetricsConfig) -> Decimal {
    let total: Decimal = ods
        .iter()
        .filter(|od| od.covers(date))
        .map(|od| match &od.kind {
            OdKind::Hours { hours } => *hours,
            OdKind::HalfDay => config.od_half_day_hours,
            OdKind::FullDay => config.od_full_day_hours,
        })
        .sum();
    round2(total)
}
