//! Ingestion and the pair-match-measure pipeline.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{
    self, AmbiguityDetails, CandidateSource, DayMetricsInput, DayPunches, MatchOutcome,
    ShiftAssignment, calculate_day_metrics, consolidate_days, evaluate_early_out, match_shift,
    normalize_employee_number, od_hours_for_date, pair_punches, pairing_window,
    resolve_candidate_pool, round2, shift_bounds, validate_punch,
};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AmbiguousShiftCase, AttendanceStatus, CaseStatus, DailyAttendanceRecord, DerivationStep,
    DerivationTrace, EmployeeProfile, NonWorkingDay, RawPunch, RosterAssignment,
    ShiftDefinition, YearMonth,
};

use super::reports::{DayRunReport, IngestReport};
use super::{AttendanceEngine, SYSTEM_REVIEWER};

/// What happened to the pending case of a key after a derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CaseChange {
    Raised,
    Updated,
    Resolved,
    Unchanged,
}

impl AttendanceEngine {
    /// Validates and stores raw punches.
    ///
    /// Invalid tuples are rejected and reported; exact duplicates of a
    /// stored punch (same employee, timestamp and source) are counted and
    /// ignored. Nothing is paired here.
    ///
    /// # Returns
    ///
    /// An [`IngestReport`], or a `Store` error if the store fails.
    pub fn ingest_punches(&self, raw_punches: &[RawPunch]) -> EngineResult<IngestReport> {
        let start_time = Instant::now();
        let mut report = IngestReport::default();
        let mut employees = BTreeSet::new();

        for raw in raw_punches {
            match validate_punch(raw, &self.config.pairing) {
                Ok(punch) => {
                    employees.insert(punch.employee_number.clone());
                    if self.store.insert_punch(punch)? {
                        report.accepted += 1;
                    } else {
                        report.duplicates += 1;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Rejected punch");
                    report.rejected += 1;
                    report.errors.push(err.to_string());
                }
            }
        }

        report.employees = employees.into_iter().collect();
        info!(
            received = raw_punches.len(),
            accepted = report.accepted,
            duplicates = report.duplicates,
            rejected = report.rejected,
            duration_us = start_time.elapsed().as_micros(),
            "Ingested punches"
        );
        Ok(report)
    }

    /// Pairs, matches and measures one employee's shift dates.
    ///
    /// Punches are read across the range extended by a day on each side.
    /// Each shift date with punches gets its daily record rewritten, except
    /// locked records, which are left alone. Ambiguous days raise or refresh
    /// a pending case; days that now resolve close their pending case.
    /// Summaries of every month written to are then recomputed.
    ///
    /// # Arguments
    ///
    /// * `employee_number` - The employee; normalised before use
    /// * `from`, `to` - The inclusive range of shift dates
    ///
    /// # Returns
    ///
    /// A [`DayRunReport`], or `EmployeeNotFound` / `Store` if the employee
    /// or their punches cannot be read. A date that fails is recorded in
    /// `day_failures` and the remaining dates still run; recompute failures
    /// are reported the same way.
    pub fn pair_and_resolve(
        &self,
        employee_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<DayRunReport> {
        let start_time = Instant::now();
        let employee_number = normalize_employee_number(employee_number);
        let employee = self.employee_profile(&employee_number)?;
        let mut report = DayRunReport::new(&employee_number, from, to);

        let months = self.locks.with_lock(&employee_number, || {
            self.pair_and_resolve_locked(&employee, &mut report)
        })?;

        report.recompute_failures = self.recompute_months(&employee_number, months);

        info!(
            employee_number = %employee_number,
            from = %from,
            to = %to,
            records_written = report.records_written,
            skipped_locked = report.skipped_locked,
            cases_raised = report.cases_raised,
            cases_auto_resolved = report.cases_auto_resolved,
            day_failures = report.day_failures.len(),
            duration_us = start_time.elapsed().as_micros(),
            "Paired and resolved attendance"
        );
        Ok(report)
    }

    fn pair_and_resolve_locked(
        &self,
        employee: &EmployeeProfile,
        report: &mut DayRunReport,
    ) -> EngineResult<BTreeSet<YearMonth>> {
        let employee_number = employee.employee_number.as_str();
        let (window_from, window_to) = pairing_window(report.from, report.to);
        let punches = self.store.punches(employee_number, window_from, window_to)?;
        let pairing = pair_punches(
            &punches,
            report.from,
            report.to,
            self.config.pairing.max_pairing_window_hours,
        );
        report.unmatched_outs = pairing.unmatched_outs.clone();

        let mut months = BTreeSet::new();
        for day in consolidate_days(&pairing.intervals) {
            if let Err(err) = self.resolve_day(employee, &day, report, &mut months) {
                warn!(
                    employee_number = %employee_number,
                    date = %day.date,
                    error = %err,
                    "Shift date failed"
                );
                report.record_day_failure(day.date, err.to_string());
            }
        }

        Ok(months)
    }

    /// Derives and writes one shift date.
    ///
    /// The record is fully derived before anything is written, so a failed
    /// derivation leaves the store untouched. `months` gains the date's
    /// month as soon as the record is written.
    fn resolve_day(
        &self,
        employee: &EmployeeProfile,
        day: &DayPunches,
        report: &mut DayRunReport,
        months: &mut BTreeSet<YearMonth>,
    ) -> EngineResult<()> {
        let employee_number = employee.employee_number.as_str();
        let existing = self.store.daily_record(employee_number, day.date)?;
        if existing.as_ref().is_some_and(|r| r.locked) {
            debug!(
                employee_number = %employee_number,
                date = %day.date,
                "Skipping locked record"
            );
            report.skipped_locked += 1;
            return Ok(());
        }

        let mut record = existing.unwrap_or_else(|| {
            DailyAttendanceRecord::new(employee_number, day.date, AttendanceStatus::Absent)
        });
        record.in_time = Some(day.in_time);
        record.out_time = day.out_time;
        record.merge_sources(&day.sources);

        let mut trace = DerivationTrace::default();
        let outcome = self.derive_day(employee, &mut record, &mut trace)?;
        self.store.upsert_daily_record(record.clone())?;
        report.records_written += 1;
        months.insert(YearMonth::from_date(day.date));
        report.traces.insert(day.date, trace);

        match self.sync_case(&record, &outcome, SYSTEM_REVIEWER)? {
            CaseChange::Raised => report.cases_raised += 1,
            CaseChange::Updated => report.cases_updated += 1,
            CaseChange::Resolved => report.cases_auto_resolved += 1,
            CaseChange::Unchanged => {}
        }
        Ok(())
    }

    pub(super) fn employee_profile(&self, employee_number: &str) -> EngineResult<EmployeeProfile> {
        self.catalog
            .employee(employee_number)
            .ok_or_else(|| EngineError::EmployeeNotFound {
                employee_number: employee_number.to_string(),
            })
    }

    pub(super) fn shift_definition(&self, shift_id: &str) -> EngineResult<ShiftDefinition> {
        self.catalog
            .shift(shift_id)
            .ok_or_else(|| EngineError::ShiftNotFound {
                shift_id: shift_id.to_string(),
            })
    }

    pub(super) fn non_working_day(
        &self,
        employee_number: &str,
        date: NaiveDate,
    ) -> Option<NonWorkingDay> {
        match self.catalog.roster_entry(employee_number, date) {
            Some(RosterAssignment::WeekOff) => Some(NonWorkingDay::WeekOff),
            Some(RosterAssignment::Holiday) => Some(NonWorkingDay::Holiday),
            _ => None,
        }
    }

    /// Runs the matcher on a record's times, then the metrics.
    pub(super) fn derive_day(
        &self,
        employee: &EmployeeProfile,
        record: &mut DailyAttendanceRecord,
        trace: &mut DerivationTrace,
    ) -> EngineResult<MatchOutcome> {
        let in_time = record
            .in_time
            .ok_or_else(|| EngineError::CalculationError {
                message: format!(
                    "cannot match a shift for {} on {} without an in-time",
                    record.employee_number, record.date
                ),
            })?;

        let pool = resolve_candidate_pool(self.catalog.as_ref(), employee, record.date)?;
        let result = match_shift(
            &pool,
            record.date,
            in_time,
            record.out_time,
            &self.config.matching,
            trace.next_step_number(),
        );
        trace.push(result.audit_step);

        match &result.outcome {
            MatchOutcome::Assigned(assignment) => self.apply_assignment(record, assignment),
            MatchOutcome::Ambiguous(AmbiguityDetails {
                provisional: Some(assignment),
                ..
            }) => self.apply_assignment(record, assignment),
            MatchOutcome::Ambiguous(_) | MatchOutcome::NonWorking { .. } => record.clear_shift(),
        }
        debug!(
            employee_number = %record.employee_number,
            date = %record.date,
            shift_id = ?record.shift_id,
            "Matched shift"
        );

        self.refresh_external_hours(record)?;
        self.apply_metrics(record, trace)?;
        Ok(result.outcome)
    }

    /// Re-derives a record against a chosen shift.
    ///
    /// Uses the same lateness and early-out derivation as automatic matching.
    pub(super) fn rederive_with_shift(
        &self,
        record: &mut DailyAttendanceRecord,
        shift: &ShiftDefinition,
        trace: &mut DerivationTrace,
    ) -> EngineResult<()> {
        let assignment = calculation::assign_shift(
            shift,
            record.date,
            record.in_time,
            record.out_time,
            &self.config.matching,
            CandidateSource::Manual,
        );
        trace.push(DerivationStep {
            step_number: trace.next_step_number(),
            rule_id: "manual_shift_assignment".to_string(),
            rule_name: "Manual Shift Assignment".to_string(),
            input: serde_json::json!({
                "shift_id": shift.id,
                "in_time": record.in_time.map(|t| t.to_string()),
                "out_time": record.out_time.map(|t| t.to_string()),
            }),
            output: serde_json::json!({
                "late_in_minutes": assignment.late_in_minutes,
                "early_out_minutes": assignment.early_out_minutes,
                "expected_hours": assignment.expected_hours.normalize().to_string(),
            }),
            reasoning: format!("Shift {} chosen for {}", shift.name, record.date),
        });

        self.apply_assignment(record, &assignment);
        self.refresh_external_hours(record)?;
        self.apply_metrics(record, trace)
    }

    fn apply_assignment(&self, record: &mut DailyAttendanceRecord, assignment: &ShiftAssignment) {
        record.shift_id = Some(assignment.shift_id.clone());
        record.shift_name = Some(assignment.shift_name.clone());
        record.payable_shifts = Some(assignment.payable_shifts);
        record.late_in_minutes = assignment.late_in_minutes;
        record.early_out_minutes = assignment.early_out_minutes;
        record.is_late_in = assignment.late_in_minutes > 0;
        record.is_early_out = assignment.early_out_minutes > 0;
        record.expected_hours = Some(assignment.expected_hours);
        record.is_roster_deviation = matches!(
            self.catalog.roster_entry(&record.employee_number, record.date),
            Some(RosterAssignment::Shift { shift_id }) if shift_id != assignment.shift_id
        );
    }

    /// Reloads approved overtime and OD hours for the record's date.
    pub(super) fn refresh_external_hours(
        &self,
        record: &mut DailyAttendanceRecord,
    ) -> EngineResult<()> {
        let overtime = self
            .approvals
            .overtime(&record.employee_number, record.date, record.date)?;
        let ods = self
            .approvals
            .ods(&record.employee_number, record.date, record.date)?;

        record.ot_hours = round2(overtime.iter().map(|o| o.hours).sum::<Decimal>());
        record.od_hours = od_hours_for_date(&ods, record.date, &self.config.metrics);
        Ok(())
    }

    /// Recalculates total hours, extra hours, status and the early-out
    /// evaluation from the record's current state.
    pub(super) fn apply_metrics(
        &self,
        record: &mut DailyAttendanceRecord,
        trace: &mut DerivationTrace,
    ) -> EngineResult<()> {
        let shift_end = match &record.shift_id {
            Some(shift_id) => {
                let shift = self.shift_definition(shift_id)?;
                Some(shift_bounds(&shift, record.date, record.in_time).1)
            }
            None => None,
        };
        let non_working = self.non_working_day(&record.employee_number, record.date);

        let result = calculate_day_metrics(
            &DayMetricsInput::from_record(record, shift_end, non_working),
            &self.config.metrics,
            trace.next_step_number(),
        );
        result.metrics.apply_to(record);
        trace.push(result.audit_step);

        record.early_out_deduction = if record.shift_id.is_some() && record.early_out_minutes > 0 {
            let evaluation = evaluate_early_out(record.early_out_minutes, &self.config.early_out);
            trace.push(DerivationStep {
                step_number: trace.next_step_number(),
                rule_id: "early_out_deduction".to_string(),
                rule_name: "Early-Out Deduction".to_string(),
                input: serde_json::json!({ "early_out_minutes": record.early_out_minutes }),
                output: serde_json::json!({
                    "deduction_applied": evaluation.deduction_applied,
                    "deduction_type": evaluation.deduction_type,
                }),
                reasoning: evaluation.reason.clone(),
            });
            Some(evaluation)
        } else {
            None
        };
        Ok(())
    }

    /// Raises, refreshes or closes the pending case for a record's key.
    pub(super) fn sync_case(
        &self,
        record: &DailyAttendanceRecord,
        outcome: &MatchOutcome,
        reviewer: &str,
    ) -> EngineResult<CaseChange> {
        let pending = self
            .store
            .pending_case(&record.employee_number, record.date)?;

        match (outcome, pending) {
            (MatchOutcome::Ambiguous(details), Some(mut case)) => {
                fill_case(&mut case, record, details);
                self.store.upsert_case(case)?;
                Ok(CaseChange::Updated)
            }
            (MatchOutcome::Ambiguous(details), None) => {
                let Some(in_time) = record.in_time else {
                    return Ok(CaseChange::Unchanged);
                };
                let mut case = AmbiguousShiftCase {
                    id: Uuid::new_v4(),
                    employee_number: record.employee_number.clone(),
                    date: record.date,
                    in_time,
                    out_time: record.out_time,
                    candidates: Vec::new(),
                    reason: details.reason,
                    rationale: String::new(),
                    requires_manual_selection: true,
                    provisional_shift_id: None,
                    status: CaseStatus::Pending,
                    resolution: None,
                    created_at: Utc::now(),
                };
                fill_case(&mut case, record, details);
                info!(
                    employee_number = %record.employee_number,
                    date = %record.date,
                    case_id = %case.id,
                    reason = ?case.reason,
                    requires_manual_selection = case.requires_manual_selection,
                    "Raised ambiguous shift case"
                );
                self.store.upsert_case(case)?;
                Ok(CaseChange::Raised)
            }
            (MatchOutcome::Assigned(assignment), Some(mut case)) => {
                case.close(
                    CaseStatus::Resolved,
                    Some(assignment.shift_id.clone()),
                    reviewer,
                    Some("Resolved on re-derivation".to_string()),
                );
                self.store.upsert_case(case)?;
                Ok(CaseChange::Resolved)
            }
            (MatchOutcome::NonWorking { .. }, Some(mut case)) => {
                case.close(
                    CaseStatus::Resolved,
                    None,
                    reviewer,
                    Some("Roster marks the day as non-working".to_string()),
                );
                self.store.upsert_case(case)?;
                Ok(CaseChange::Resolved)
            }
            (_, None) => Ok(CaseChange::Unchanged),
        }
    }
}

fn fill_case(
    case: &mut AmbiguousShiftCase,
    record: &DailyAttendanceRecord,
    details: &AmbiguityDetails,
) {
    if let Some(in_time) = record.in_time {
        case.in_time = in_time;
    }
    case.out_time = record.out_time;
    case.candidates = details.candidates.clone();
    case.reason = details.reason;
    case.rationale = details.rationale.clone();
    case.requires_manual_selection = details.requires_manual_selection;
    case.provisional_shift_id = details.provisional.as_ref().map(|p| p.shift_id.clone());
}
