//! Derivation logic for the Attendance Derivation Engine.
//!
//! This module contains the pure stages of the pipeline: punch validation,
//! punch pairing, shift matching, day metrics, early-out deduction and
//! monthly aggregation. None of these functions touch the store; the
//! engine wires them together.

mod day_metrics;
mod early_out_deduction;
mod monthly_summary;
mod punch_pairing;
mod punch_validation;
mod shift_matching;
mod time_math;

pub use day_metrics::{
    DayMetrics, DayMetricsInput, DayMetricsResult, calculate_day_metrics, od_hours_for_date,
};
pub use early_out_deduction::evaluate_early_out;
pub use monthly_summary::{MonthlyInputs, aggregate_month};
pub use punch_pairing::{
    DayPunches, IntervalState, PairingOutcome, PunchInterval, consolidate_days, pair_punches,
    pairing_window,
};
pub use punch_validation::{
    normalize_employee_number, parse_direction, parse_timestamp, validate_punch,
};
pub use shift_matching::{
    AmbiguityDetails, CandidatePool, CandidateSource, MatchOutcome, MatchResult,
    ShiftAssignment, assign_shift, in_shift_window, match_shift, nearest_by_start,
    resolve_candidate_pool, shift_bounds,
};
pub use time_math::{
    MINUTES_PER_DAY, circular_minute_distance, hours_between, minute_of_day, minute_of_day_at,
    minutes_between, round1, round2,
};
