//! Shift matching.
//!
//! This module resolves a paired interval to a shift. Candidates come from
//! the first non-empty source in priority order: roster override,
//! designation pool, department pool, then every active shift. A candidate
//! matches when the IN falls within `[start, start + grace]`; several
//! matches are narrowed down by comparing the OUT against each end time.
//!
//! Matching never guesses silently. When it cannot settle on exactly one
//! shift it returns [`MatchOutcome::Ambiguous`] so the caller can raise a
//! case for review.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::MatchingConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AmbiguityReason, CandidateShift, DerivationStep, EmployeeProfile, NonWorkingDay,
    RosterAssignment, ShiftDefinition,
};
use crate::sources::ShiftCatalog;

use super::time_math::{minute_of_day, minutes_between, MINUTES_PER_DAY};

/// Where a candidate pool came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Roster override for the employee and date.
    Roster,
    /// Shifts linked to the employee's designation.
    Designation,
    /// Shifts linked to the employee's department.
    Department,
    /// Every active shift.
    Global,
    /// Chosen by a person.
    Manual,
}

/// The candidates for one employee-day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidatePool {
    /// The roster names a shift; it is assigned without window matching.
    Roster(ShiftDefinition),
    /// The roster marks the day as non-working.
    NonWorking(NonWorkingDay),
    /// Shifts to match against.
    Pool {
        /// The source of the pool.
        source: CandidateSource,
        /// Active shifts in the pool.
        shifts: Vec<ShiftDefinition>,
    },
}

/// A resolved shift with its derived minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    /// The shift ID.
    pub shift_id: String,
    /// The shift name.
    pub shift_name: String,
    /// Minutes past start plus grace.
    pub late_in_minutes: u32,
    /// Minutes before the shift end.
    pub early_out_minutes: u32,
    /// The shift duration.
    pub expected_hours: Decimal,
    /// The shift's payable weight.
    pub payable_shifts: Decimal,
    /// How the shift was chosen.
    pub source: CandidateSource,
}

/// Why matching stopped short of one shift, and what to offer a reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguityDetails {
    /// Why matching stopped.
    pub reason: AmbiguityReason,
    /// Shifts a reviewer may choose from.
    pub candidates: Vec<CandidateShift>,
    /// Human-readable explanation.
    pub rationale: String,
    /// False when a best-effort shift is assigned anyway.
    pub requires_manual_selection: bool,
    /// The best-effort assignment, if any.
    pub provisional: Option<ShiftAssignment>,
}

/// Tagged result of matching one interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Exactly one shift resolved.
    Assigned(ShiftAssignment),
    /// Human review is needed.
    Ambiguous(AmbiguityDetails),
    /// Non-working roster day.
    NonWorking {
        /// Week off or holiday.
        day: NonWorkingDay,
    },
}

/// The outcome together with its derivation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// The matching outcome.
    pub outcome: MatchOutcome,
    /// The derivation step recording the decision.
    pub audit_step: DerivationStep,
}

/// Resolves the candidate pool for an employee on a date.
///
/// # Returns
///
/// The first non-empty source among roster override, designation pool,
/// department pool and all active shifts. Returns `ShiftNotFound` if the
/// roster names a shift the catalog does not know.
pub fn resolve_candidate_pool(
    catalog: &dyn ShiftCatalog,
    employee: &EmployeeProfile,
    date: NaiveDate,
) -> EngineResult<CandidatePool> {
    if let Some(assignment) = catalog.roster_entry(&employee.employee_number, date) {
        return match assignment {
            RosterAssignment::Shift { shift_id } => catalog
                .shift(&shift_id)
                .map(CandidatePool::Roster)
                .ok_or(EngineError::ShiftNotFound { shift_id }),
            RosterAssignment::WeekOff => Ok(CandidatePool::NonWorking(NonWorkingDay::WeekOff)),
            RosterAssignment::Holiday => Ok(CandidatePool::NonWorking(NonWorkingDay::Holiday)),
        };
    }

    let active = |shifts: Vec<ShiftDefinition>| -> Vec<ShiftDefinition> {
        shifts.into_iter().filter(|s| s.is_active).collect()
    };

    if let Some(designation) = &employee.designation {
        let shifts = active(catalog.designation_shifts(designation));
        if !shifts.is_empty() {
            return Ok(CandidatePool::Pool {
                source: CandidateSource::Designation,
                shifts,
            });
        }
    }

    if let Some(department) = &employee.department {
        let shifts = active(catalog.department_shifts(department));
        if !shifts.is_empty() {
            return Ok(CandidatePool::Pool {
                source: CandidateSource::Department,
                shifts,
            });
        }
    }

    Ok(CandidatePool::Pool {
        source: CandidateSource::Global,
        shifts: active(catalog.active_shifts()),
    })
}

/// Returns true if `time` falls within `[start, start + grace]`, wrapping midnight.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::in_shift_window;
/// use chrono::NaiveTime;
///
/// let start = NaiveTime::from_hms_opt(23, 50, 0).unwrap();
/// assert!(in_shift_window(NaiveTime::from_hms_opt(0, 3, 0).unwrap(), start, 15));
/// assert!(!in_shift_window(NaiveTime::from_hms_opt(23, 45, 0).unwrap(), start, 15));
/// ```
pub fn in_shift_window(time: NaiveTime, start: NaiveTime, grace_minutes: u32) -> bool {
    let start_minute = minute_of_day(start);
    let end_minute = start_minute + i64::from(grace_minutes);
    let minute = minute_of_day(time);

    if end_minute >= MINUTES_PER_DAY {
        minute >= start_minute || minute <= end_minute - MINUTES_PER_DAY
    } else {
        minute >= start_minute && minute <= end_minute
    }
}

/// The start and end instants of a shift for an interval.
///
/// The shift is anchored on the shift date. When the IN is known and the
/// anchored start lies more than 12 hours after it, the shift is taken to
/// have started the previous day (an IN just after midnight for a shift
/// starting just before it).
pub fn shift_bounds(
    shift: &ShiftDefinition,
    shift_date: NaiveDate,
    in_time: Option<NaiveDateTime>,
) -> (NaiveDateTime, NaiveDateTime) {
    let starts_previous_day =
        in_time.is_some_and(|t| shift.start_on(shift_date) - t > Duration::hours(12));
    let start_date = if starts_previous_day {
        shift_date.pred_opt().unwrap_or(shift_date)
    } else {
        shift_date
    };
    (shift.start_on(start_date), shift.end_on(start_date))
}

/// Derives the assignment of a known shift to an interval.
///
/// The automatic path, case resolution and manual assignment all go
/// through here, so lateness and early-out are always derived the same way.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::{assign_shift, CandidateSource};
/// use attendance_engine::config::MatchingConfig;
/// use attendance_engine::models::ShiftDefinition;
/// use chrono::{NaiveDateTime, NaiveTime};
/// use rust_decimal::Decimal;
///
/// let general = ShiftDefinition {
///     id: "GEN".to_string(),
///     name: "General".to_string(),
///     start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
///     end_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
///     duration_hours: None,
///     grace_period_minutes: Some(15),
///     payable_shifts: Decimal::ONE,
///     is_active: true,
/// };
/// let in_time = NaiveDateTime::parse_from_str("2024-01-15 09:25:00", "%Y-%m-%d %H:%M:%S").unwrap();
///
/// let assignment = assign_shift(
///     &general,
///     in_time.date(),
///     Some(in_time),
///     None,
///     &MatchingConfig::default(),
///     CandidateSource::Roster,
/// );
/// assert_eq!(assignment.late_in_minutes, 10);
/// ```
pub fn assign_shift(
    shift: &ShiftDefinition,
    shift_date: NaiveDate,
    in_time: Option<NaiveDateTime>,
    out_time: Option<NaiveDateTime>,
    config: &MatchingConfig,
    source: CandidateSource,
) -> ShiftAssignment {
    let grace = Duration::minutes(i64::from(
        shift.grace_minutes(config.default_grace_period_minutes),
    ));
    let (start, end) = shift_bounds(shift, shift_date, in_time);

    let late_in_minutes = in_time
        .map(|t| clamp_minutes(minutes_between(start + grace, t)))
        .unwrap_or(0);
    let early_out_minutes = out_time
        .map(|t| clamp_minutes(minutes_between(t, end)))
        .unwrap_or(0);

    ShiftAssignment {
        shift_id: shift.id.clone(),
        shift_name: shift.name.clone(),
        late_in_minutes,
        early_out_minutes,
        expected_hours: shift.duration(),
        payable_shifts: shift.payable_shifts,
        source,
    }
}

fn clamp_minutes(minutes: i64) -> u32 {
    u32::try_from(minutes.max(0)).unwrap_or(u32::MAX)
}

/// Matches an interval against a candidate pool.
///
/// # Arguments
///
/// * `pool` - Candidates from [`resolve_candidate_pool`]
/// * `shift_date` - The interval's shift date
/// * `in_time` - The interval's IN
/// * `out_time` - The interval's OUT, if paired
/// * `config` - Grace and tolerance settings
/// * `step_number` - The step number for derivation trace sequencing
///
/// # Returns
///
/// A [`MatchResult`] whose outcome is:
/// - `Assigned` for a roster shift, a single window match, or a single
///   end-time survivor
/// - `Ambiguous` with `requires_manual_selection = false` and a provisional
///   assignment when several end times are within tolerance
/// - `Ambiguous` with `requires_manual_selection = true` when no window
///   matched, no end time is within tolerance, or there is no OUT
/// - `NonWorking` for a roster week off or holiday
pub fn match_shift(
    pool: &CandidatePool,
    shift_date: NaiveDate,
    in_time: NaiveDateTime,
    out_time: Option<NaiveDateTime>,
    config: &MatchingConfig,
    step_number: u32,
) -> MatchResult {
    let input = serde_json::json!({
        "shift_date": shift_date.to_string(),
        "in_time": in_time.to_string(),
        "out_time": out_time.map(|t| t.to_string()),
    });

    let (source, shifts) = match pool {
        CandidatePool::Roster(shift) => {
            let assignment = assign_shift(
                shift,
                shift_date,
                Some(in_time),
                out_time,
                config,
                CandidateSource::Roster,
            );
            let reasoning = format!("Roster assigns shift {} for {}", shift.name, shift_date);
            return finish(MatchOutcome::Assigned(assignment), input, reasoning, step_number);
        }
        CandidatePool::NonWorking(day) => {
            let reasoning = format!(
                "Roster marks {} as {}; no shift assigned",
                shift_date,
                match day {
                    NonWorkingDay::WeekOff => "week off",
                    NonWorkingDay::Holiday => "holiday",
                }
            );
            return finish(MatchOutcome::NonWorking { day: *day }, input, reasoning, step_number);
        }
        CandidatePool::Pool { source, shifts } => (*source, shifts),
    };

    let in_clock = in_time.time();
    let window_matches: Vec<&ShiftDefinition> = shifts
        .iter()
        .filter(|s| {
            in_shift_window(
                in_clock,
                s.start_time,
                s.grace_minutes(config.default_grace_period_minutes),
            )
        })
        .collect();

    if window_matches.is_empty() {
        let candidates = shifts
            .iter()
            .map(|s| {
                let distance = super::time_math::circular_minute_distance(in_clock, s.start_time);
                candidate(
                    s,
                    format!(
                        "In-time {} is {} min from {} start {}",
                        in_clock.format("%H:%M"),
                        distance,
                        s.name,
                        s.start_time.format("%H:%M")
                    ),
                )
            })
            .collect();
        let rationale = format!(
            "no window matched: in-time {} is outside every {:?} shift window",
            in_clock.format("%H:%M"),
            source
        );
        return finish(
            MatchOutcome::Ambiguous(AmbiguityDetails {
                reason: AmbiguityReason::NoWindowMatched,
                candidates,
                rationale: rationale.clone(),
                requires_manual_selection: true,
                provisional: None,
            }),
            input,
            rationale,
            step_number,
        );
    }

    if let [only] = window_matches.as_slice() {
        let assignment = assign_shift(only, shift_date, Some(in_time), out_time, config, source);
        let reasoning = format!(
            "In-time {} falls inside {} window {}-{}",
            in_clock.format("%H:%M"),
            only.name,
            only.start_time.format("%H:%M"),
            (only.start_time
                + Duration::minutes(i64::from(
                    only.grace_minutes(config.default_grace_period_minutes)
                )))
            .format("%H:%M")
        );
        return finish(MatchOutcome::Assigned(assignment), input, reasoning, step_number);
    }

    let window_candidates: Vec<CandidateShift> = window_matches
        .iter()
        .map(|s| {
            candidate(
                s,
                format!(
                    "In-time {} within {} window starting {}",
                    in_clock.format("%H:%M"),
                    s.name,
                    s.start_time.format("%H:%M")
                ),
            )
        })
        .collect();

    let Some(out_time) = out_time else {
        let rationale = format!(
            "{} shift windows match in-time {} and there is no out-time to disambiguate",
            window_matches.len(),
            in_clock.format("%H:%M")
        );
        return finish(
            MatchOutcome::Ambiguous(AmbiguityDetails {
                reason: AmbiguityReason::MissingOutTime,
                candidates: window_candidates,
                rationale: rationale.clone(),
                requires_manual_selection: true,
                provisional: None,
            }),
            input,
            rationale,
            step_number,
        );
    };

    let tolerance = i64::from(config.out_time_tolerance_minutes);
    let mut survivors: Vec<(i64, &ShiftDefinition)> = window_matches
        .iter()
        .map(|s| {
            let (_, end) = shift_bounds(s, shift_date, Some(in_time));
            (minutes_between(end, out_time).abs(), *s)
        })
        .filter(|(distance, _)| *distance <= tolerance)
        .collect();
    survivors.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));

    match survivors.as_slice() {
        [] => {
            let rationale = format!(
                "{} shift windows match in-time {} but no end time is within {} min of out-time {}",
                window_matches.len(),
                in_clock.format("%H:%M"),
                tolerance,
                out_time.format("%H:%M")
            );
            finish(
                MatchOutcome::Ambiguous(AmbiguityDetails {
                    reason: AmbiguityReason::NoEndTimeWithinTolerance,
                    candidates: window_candidates,
                    rationale: rationale.clone(),
                    requires_manual_selection: true,
                    provisional: None,
                }),
                input,
                rationale,
                step_number,
            )
        }
        [(distance, only)] => {
            let assignment =
                assign_shift(only, shift_date, Some(in_time), Some(out_time), config, source);
            let reasoning = format!(
                "{} shift windows match in-time; only {} ends within {} min of out-time ({} min)",
                window_matches.len(),
                only.name,
                tolerance,
                distance
            );
            finish(MatchOutcome::Assigned(assignment), input, reasoning, step_number)
        }
        [(_, closest), ..] => {
            let provisional =
                assign_shift(closest, shift_date, Some(in_time), Some(out_time), config, source);
            let candidates = survivors
                .iter()
                .map(|(distance, s)| {
                    candidate(
                        s,
                        format!(
                            "Out-time {} is {} min from {} end {}",
                            out_time.format("%H:%M"),
                            distance,
                            s.name,
                            s.end_time.format("%H:%M")
                        ),
                    )
                })
                .collect();
            let rationale = format!(
                "{} end times are within {} min of out-time {}; assigned closest shift {} pending confirmation",
                survivors.len(),
                tolerance,
                out_time.format("%H:%M"),
                closest.name
            );
            finish(
                MatchOutcome::Ambiguous(AmbiguityDetails {
                    reason: AmbiguityReason::MultipleEndTimesWithinTolerance,
                    candidates,
                    rationale: rationale.clone(),
                    requires_manual_selection: false,
                    provisional: Some(provisional),
                }),
                input,
                rationale,
                step_number,
            )
        }
    }
}

/// Picks the candidate whose start time is nearest to the IN.
///
/// Ties go to the earlier start, then the lower shift ID.
pub fn nearest_by_start<'a>(
    in_time: NaiveTime,
    shifts: impl IntoIterator<Item = &'a ShiftDefinition>,
) -> Option<&'a ShiftDefinition> {
    shifts.into_iter().min_by(|a, b| {
        let da = super::time_math::circular_minute_distance(in_time, a.start_time);
        let db = super::time_math::circular_minute_distance(in_time, b.start_time);
        da.cmp(&db)
            .then_with(|| a.start_time.cmp(&b.start_time))
            .then_with(|| a.id.cmp(&b.id))
    })
}

fn candidate(shift: &ShiftDefinition, match_reason: String) -> CandidateShift {
    CandidateShift {
        shift_id: shift.id.clone(),
        shift_name: shift.name.clone(),
        start_time: shift.start_time,
        end_time: shift.end_time,
        match_reason,
    }
}

fn finish(
    outcome: MatchOutcome,
    input: serde_json::Value,
    reasoning: String,
    step_number: u32,
) -> MatchResult {
    let output = match &outcome {
        MatchOutcome::Assigned(a) => serde_json::json!({
            "outcome": "assigned",
            "shift_id": a.shift_id,
            "late_in_minutes": a.late_in_minutes,
            "early_out_minutes": a.early_out_minutes,
            "expected_hours": a.expected_hours.normalize().to_string(),
        }),
        MatchOutcome::Ambiguous(d) => serde_json::json!({
            "outcome": "ambiguous",
            "reason": d.reason,
            "candidates": d.candidates.iter().map(|c| c.shift_id.clone()).collect::<Vec<_>>(),
            "requires_manual_selection": d.requires_manual_selection,
            "provisional_shift_id": d.provisional.as_ref().map(|p| p.shift_id.clone()),
        }),
        MatchOutcome::NonWorking { day } => serde_json::json!({
            "outcome": "non_working",
            "day": day,
        }),
    };

    MatchResult {
        outcome,
        audit_step: DerivationStep {
            step_number,
            rule_id: "shift_matching".to_string(),
            rule_name: "Shift Matching".to_string(),
            input,
            output,
            reasoning,
        },
    }
}
