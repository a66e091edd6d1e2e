//! Monthly aggregation.
//!
//! The monthly summary is a projection: it is rebuilt in full from the
//! month's daily records and approved facts every time, never patched.

use rust_decimal::Decimal;

use crate::config::EarlyOutPolicy;
use crate::models::{
    ApprovedLeave, ApprovedOd, ApprovedOvertime, ApprovedPermission, DailyAttendanceRecord,
    DeductionType, EarlyOutBreakdown, MonthlyAttendanceSummary, YearMonth,
};

use super::early_out_deduction::evaluate_early_out;
use super::time_math::{round1, round2};

/// Everything the aggregation reads for one employee-month.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthlyInputs<'a> {
    /// Daily records.
    pub records: &'a [DailyAttendanceRecord],
    /// Approved leaves.
    pub leaves: &'a [ApprovedLeave],
    /// Approved ODs.
    pub ods: &'a [ApprovedOd],
    /// Approved overtime.
    pub overtime: &'a [ApprovedOvertime],
    /// Approved permissions.
    pub permissions: &'a [ApprovedPermission],
}

/// Builds the monthly summary for an employee.
///
/// Inputs belonging to other employees or falling outside the month are
/// ignored, so callers may pass wider slices.
///
/// # Arguments
///
/// * `employee_number` - The employee
/// * `month` - The month to summarise
/// * `inputs` - Daily records and approved facts
/// * `policy` - Early-out policy used to evaluate each early-out day
///
/// # Returns
///
/// The complete [`MonthlyAttendanceSummary`]. Identical inputs always give
/// an identical summary.
pub fn aggregate_month(
    employee_number: &str,
    month: YearMonth,
    inputs: &MonthlyInputs<'_>,
    policy: &EarlyOutPolicy,
) -> MonthlyAttendanceSummary {
    let records: Vec<&DailyAttendanceRecord> = inputs
        .records
        .iter()
        .filter(|r| r.employee_number == employee_number && month.contains(r.date))
        .collect();

    let present: Vec<&&DailyAttendanceRecord> = records
        .iter()
        .filter(|r| r.status.counts_as_present())
        .collect();
    let present_payable: Decimal = present
        .iter()
        .map(|r| r.payable_shifts.unwrap_or(Decimal::ONE))
        .sum();

    let leaves: Decimal = inputs
        .leaves
        .iter()
        .filter(|l| l.employee_number == employee_number)
        .map(|l| l.days_in(month))
        .sum();

    let ods: Decimal = inputs
        .ods
        .iter()
        .filter(|o| o.employee_number == employee_number)
        .map(|o| o.days_in(month))
        .sum();

    let ot_hours: Decimal = inputs
        .overtime
        .iter()
        .filter(|o| o.employee_number == employee_number && month.contains(o.date))
        .map(|o| o.hours)
        .sum();

    let permissions: Vec<&ApprovedPermission> = inputs
        .permissions
        .iter()
        .filter(|p| p.employee_number == employee_number && month.contains(p.date))
        .collect();
    let permission_hours: Decimal = permissions.iter().map(|p| p.hours).sum();

    let extra_hours: Decimal = records.iter().map(|r| r.extra_hours).sum();

    let mut early_out_minutes = Decimal::ZERO;
    let mut deduction_days = Decimal::ZERO;
    let mut deduction_amount = Decimal::ZERO;
    let mut breakdown = EarlyOutBreakdown::default();
    let mut early_out_count = 0u32;

    for record in records.iter().filter(|r| r.early_out_minutes > 0) {
        early_out_count += 1;
        early_out_minutes += Decimal::from(record.early_out_minutes);

        let evaluation = evaluate_early_out(record.early_out_minutes, policy);
        if !evaluation.deduction_applied {
            continue;
        }
        let days = evaluation.deduction_days.unwrap_or(Decimal::ZERO);
        let amount = evaluation.deduction_amount.unwrap_or(Decimal::ZERO);
        deduction_days += days;
        deduction_amount += amount;
        match evaluation.deduction_type {
            Some(DeductionType::QuarterDay) => breakdown.quarter_day += days,
            Some(DeductionType::HalfDay) => breakdown.half_day += days,
            Some(DeductionType::FullDay) => breakdown.full_day += days,
            Some(DeductionType::CustomAmount) => breakdown.custom_amount += amount,
            None => {}
        }
    }

    MonthlyAttendanceSummary {
        employee_number: employee_number.to_string(),
        month,
        month_name: month.display_name(),
        total_days_in_month: month.days_in_month(),
        total_present_days: u32::try_from(present.len()).unwrap_or(u32::MAX),
        total_payable_shifts: round2(present_payable + ods),
        total_leaves: round1(leaves),
        total_ods: round1(ods),
        total_ot_hours: round2(ot_hours),
        total_extra_hours: round2(extra_hours),
        total_permission_hours: round2(permission_hours),
        total_permission_count: u32::try_from(permissions.len()).unwrap_or(u32::MAX),
        total_early_out_minutes: round2(early_out_minutes),
        total_early_out_deduction_days: round2(deduction_days),
        total_early_out_deduction_amount: round2(deduction_amount),
        early_out_deduction_breakdown: EarlyOutBreakdown {
            quarter_day: round2(breakdown.quarter_day),
            half_day: round2(breakdown.half_day),
            full_day: round2(breakdown.full_day),
            custom_amount: round2(breakdown.custom_amount),
        },
        early_out_count,
    }
}
