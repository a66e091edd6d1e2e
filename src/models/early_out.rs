//! Early-out deduction models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How much a matched early-out range deducts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionType {
    /// A quarter of a day.
    QuarterDay,
    /// Half a day.
    HalfDay,
    /// A full day.
    FullDay,
    /// A fixed amount configured on the range.
    CustomAmount,
}

impl DeductionType {
    /// Day fraction deducted, or `None` for custom amounts.
    ///
    /// # Example
    ///
    /// ```
    /// use attendance_engine::models::DeductionType;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(DeductionType::QuarterDay.day_fraction(), Some(Decimal::new(25, 2)));
    /// assert_eq!(DeductionType::CustomAmount.day_fraction(), None);
    /// ```
    pub fn day_fraction(&self) -> Option<Decimal> {
        match self {
            DeductionType::QuarterDay => Some(Decimal::new(25, 2)),
            DeductionType::HalfDay => Some(Decimal::new(5, 1)),
            DeductionType::FullDay => Some(Decimal::ONE),
            DeductionType::CustomAmount => None,
        }
    }
}

/// The outcome of evaluating one day's early-out minutes against the policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarlyOutEvaluation {
    /// The early-out minutes that were evaluated.
    pub early_out_minutes: u32,
    /// Whether a deduction applies.
    pub deduction_applied: bool,
    /// The matched range's deduction type.
    pub deduction_type: Option<DeductionType>,
    /// Days deducted (quarter/half/full day ranges).
    pub deduction_days: Option<Decimal>,
    /// Amount deducted (custom amount ranges).
    pub deduction_amount: Option<Decimal>,
    /// Description of the matched range, if configured.
    pub range_description: Option<String>,
    /// Why the deduction did or did not apply.
    pub reason: String,
}

impl EarlyOutEvaluation {
    /// An evaluation that deducts nothing.
    pub fn no_deduction(early_out_minutes: u32, reason: impl Into<String>) -> Self {
        Self {
            early_out_minutes,
            deduction_applied: false,
            deduction_type: None,
            deduction_days: None,
            deduction_amount: None,
            range_description: None,
            reason: reason.into(),
        }
    }
}

/// Deduction totals per deduction type for one month.
///
/// Day-based types accumulate days; `custom_amount` accumulates amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarlyOutBreakdown {
    /// Days deducted by quarter-day ranges.
    pub quarter_day: Decimal,
    /// Days deducted by half-day ranges.
    pub half_day: Decimal,
    /// Days deducted by full-day ranges.
    pub full_day: Decimal,
    /// Amount deducted by custom-amount ranges.
    pub custom_amount: Decimal,
}
