//! Early-out deduction.
//!
//! Maps a day's early-out minutes onto the configured deduction ranges.
//! Ranges are checked in ascending order of their lower bound; minutes past
//! the highest range still take that range's deduction, while minutes in a
//! gap between ranges deduct nothing.

use crate::config::{DeductionRange, EarlyOutPolicy};
use crate::models::{DeductionType, EarlyOutEvaluation};

/// Evaluates the deduction for a number of early-out minutes.
///
/// # Arguments
///
/// * `early_out_minutes` - Minutes the employee left before the shift end
/// * `policy` - The early-out policy
///
/// # Returns
///
/// An [`EarlyOutEvaluation`] whose `reason` always explains the outcome,
/// whether or not a deduction applies.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::evaluate_early_out;
/// use attendance_engine::config::{DeductionRange, EarlyOutPolicy};
/// use attendance_engine::models::DeductionType;
/// use rust_decimal::Decimal;
///
/// let policy = EarlyOutPolicy {
///     enabled: true,
///     allowed_duration_minutes: 10,
///     minimum_duration_minutes: 15,
///     deduction_ranges: vec![DeductionRange {
///         min_minutes: 15,
///         max_minutes: 30,
///         deduction_type: DeductionType::QuarterDay,
///         deduction_amount: None,
///         description: None,
///     }],
/// };
///
/// let evaluation = evaluate_early_out(20, &policy);
/// assert!(evaluation.deduction_applied);
/// assert_eq!(evaluation.deduction_days, Some(Decimal::new(25, 2)));
/// ```
pub fn evaluate_early_out(early_out_minutes: u32, policy: &EarlyOutPolicy) -> EarlyOutEvaluation {
    if !policy.enabled {
        return EarlyOutEvaluation::no_deduction(early_out_minutes, "Early-out settings disabled");
    }

    if early_out_minutes <= policy.allowed_duration_minutes {
        return EarlyOutEvaluation::no_deduction(
            early_out_minutes,
            format!(
                "Within allowed duration ({} minutes)",
                policy.allowed_duration_minutes
            ),
        );
    }

    if early_out_minutes < policy.minimum_duration_minutes {
        return EarlyOutEvaluation::no_deduction(
            early_out_minutes,
            format!(
                "Below minimum duration ({} minutes)",
                policy.minimum_duration_minutes
            ),
        );
    }

    let mut ranges: Vec<&DeductionRange> = policy.deduction_ranges.iter().collect();
    if ranges.is_empty() {
        return EarlyOutEvaluation::no_deduction(early_out_minutes, "No deduction ranges configured");
    }
    ranges.sort_by_key(|r| (r.min_minutes, r.max_minutes));

    let matched = ranges
        .iter()
        .find(|r| r.min_minutes <= early_out_minutes && early_out_minutes <= r.max_minutes)
        .or_else(|| {
            ranges
                .iter()
                .max_by_key(|r| r.max_minutes)
                .filter(|highest| early_out_minutes > highest.max_minutes)
        });

    match matched {
        Some(range) => apply_range(early_out_minutes, range),
        None => EarlyOutEvaluation::no_deduction(
            early_out_minutes,
            "No matching deduction range found",
        ),
    }
}

fn apply_range(early_out_minutes: u32, range: &DeductionRange) -> EarlyOutEvaluation {
    let (deduction_days, deduction_amount) = match range.deduction_type {
        DeductionType::CustomAmount => (None, range.deduction_amount),
        other => (other.day_fraction(), None),
    };

    let range_label = format!("{}-{} minutes", range.min_minutes, range.max_minutes);
    EarlyOutEvaluation {
        early_out_minutes,
        deduction_applied: true,
        deduction_type: Some(range.deduction_type),
        deduction_days,
        deduction_amount,
        range_description: Some(range.description.clone().unwrap_or_else(|| range_label.clone())),
        reason: format!("Matched range: {}", range_label),
    }
}
