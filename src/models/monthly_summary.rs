//! Monthly attendance summary model.
//!
//! A [`MonthlyAttendanceSummary`] is a pure projection of daily records and
//! approved facts. It is always replaced whole, never patched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EarlyOutBreakdown, YearMonth};

/// Monthly roll-up for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAttendanceSummary {
    /// The employee number.
    pub employee_number: String,
    /// The month, serialised as "YYYY-MM".
    pub month: YearMonth,
    /// Display name, e.g. "January 2024".
    pub month_name: String,
    /// Number of calendar days in the month.
    pub total_days_in_month: u32,
    /// Days with status PRESENT or PARTIAL.
    pub total_present_days: u32,
    /// Payable weight of present days plus OD days (2 dp).
    pub total_payable_shifts: Decimal,
    /// Approved leave days (1 dp).
    pub total_leaves: Decimal,
    /// Approved full/half-day OD days (1 dp).
    pub total_ods: Decimal,
    /// Approved overtime hours (2 dp).
    pub total_ot_hours: Decimal,
    /// Extra hours from daily records (2 dp).
    pub total_extra_hours: Decimal,
    /// Approved permission hours (2 dp).
    pub total_permission_hours: Decimal,
    /// Number of approved permissions.
    pub total_permission_count: u32,
    /// Early-out minutes across the month (2 dp).
    pub total_early_out_minutes: Decimal,
    /// Days deducted for early-outs (2 dp).
    pub total_early_out_deduction_days: Decimal,
    /// Amount deducted for early-outs (2 dp).
    pub total_early_out_deduction_amount: Decimal,
    /// Deductions per deduction type.
    pub early_out_deduction_breakdown: EarlyOutBreakdown,
    /// Days with a positive early-out.
    pub early_out_count: u32,
}
