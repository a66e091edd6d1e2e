//! Case review and manual corrections.
//!
//! Every operation here ends with the record locked, so a later automatic
//! sync does not overwrite a human decision. Dismissal is the exception: it
//! closes the case without touching the record.

use chrono::{Duration, NaiveDate, NaiveTime};
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::calculation::{nearest_by_start, normalize_employee_number};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AmbiguousShiftCase, CaseStatus, DailyAttendanceRecord, DerivationTrace, PunchSource,
    ShiftDefinition, YearMonth,
};

use super::AttendanceEngine;

impl AttendanceEngine {
    fn pending_case_by_id(&self, case_id: Uuid) -> EngineResult<AmbiguousShiftCase> {
        let case = self
            .store
            .case(case_id)?
            .ok_or(EngineError::CaseNotFound { case_id })?;
        if !case.is_pending() {
            return Err(EngineError::CaseAlreadyClosed {
                case_id,
                status: case.status.to_string(),
            });
        }
        Ok(case)
    }

    fn existing_record(
        &self,
        employee_number: &str,
        date: NaiveDate,
    ) -> EngineResult<DailyAttendanceRecord> {
        self.store
            .daily_record(employee_number, date)?
            .ok_or_else(|| EngineError::RecordNotFound {
                employee_number: employee_number.to_string(),
                date,
            })
    }

    /// Closes any pending case for the record's key as resolved.
    fn close_pending_case(
        &self,
        record: &DailyAttendanceRecord,
        reviewed_by: &str,
        comments: Option<String>,
    ) -> EngineResult<()> {
        if let Some(mut case) = self
            .store
            .pending_case(&record.employee_number, record.date)?
        {
            case.close(
                CaseStatus::Resolved,
                record.shift_id.clone(),
                reviewed_by,
                comments,
            );
            self.store.upsert_case(case)?;
        }
        Ok(())
    }

    /// Locks the record to a shift, writes it and closes the pending case.
    fn assign_and_lock(
        &self,
        employee_number: &str,
        date: NaiveDate,
        shift: &ShiftDefinition,
        reviewed_by: &str,
        comments: Option<String>,
    ) -> EngineResult<DailyAttendanceRecord> {
        let record = self.locks.with_lock(employee_number, || {
            let mut record = self.existing_record(employee_number, date)?;
            let mut trace = DerivationTrace::default();
            self.rederive_with_shift(&mut record, shift, &mut trace)?;
            record.locked = true;
            self.store.upsert_daily_record(record.clone())?;
            self.close_pending_case(&record, reviewed_by, comments)?;
            Ok(record)
        })?;

        self.recompute_months(employee_number, [YearMonth::from_date(date)]);
        Ok(record)
    }

    /// Resolves a pending case with a chosen shift.
    ///
    /// The linked record is re-derived against the shift exactly as the
    /// automatic path would, then locked.
    ///
    /// # Returns
    ///
    /// The updated record, or `CaseNotFound`, `CaseAlreadyClosed`,
    /// `ShiftNotFound` or `RecordNotFound`.
    pub fn resolve_ambiguous_case(
        &self,
        case_id: Uuid,
        shift_id: &str,
        reviewed_by: &str,
        comments: Option<String>,
    ) -> EngineResult<DailyAttendanceRecord> {
        let case = self.pending_case_by_id(case_id)?;
        let shift = self.shift_definition(shift_id)?;

        let record = self.assign_and_lock(
            &case.employee_number,
            case.date,
            &shift,
            reviewed_by,
            comments,
        )?;

        info!(
            case_id = %case_id,
            employee_number = %case.employee_number,
            date = %case.date,
            shift_id = %shift.id,
            reviewed_by = %reviewed_by,
            "Resolved ambiguous shift case"
        );
        Ok(record)
    }

    /// Dismisses a pending case without changing the record.
    pub fn dismiss_ambiguous_case(
        &self,
        case_id: Uuid,
        reviewed_by: &str,
        comments: Option<String>,
    ) -> EngineResult<AmbiguousShiftCase> {
        let mut case = self.pending_case_by_id(case_id)?;
        case.close(CaseStatus::Dismissed, None, reviewed_by, comments);
        self.store.upsert_case(case.clone())?;

        info!(
            case_id = %case_id,
            employee_number = %case.employee_number,
            date = %case.date,
            reviewed_by = %reviewed_by,
            "Dismissed ambiguous shift case"
        );
        Ok(case)
    }

    /// Resolves a pending case with the candidate whose start time is
    /// nearest to the IN.
    ///
    /// Returns `InvalidCorrection` if none of the case's candidates is
    /// still in the catalog.
    pub fn auto_assign_nearest(
        &self,
        case_id: Uuid,
        reviewed_by: &str,
    ) -> EngineResult<DailyAttendanceRecord> {
        let case = self.pending_case_by_id(case_id)?;
        let shifts: Vec<ShiftDefinition> = case
            .candidates
            .iter()
            .filter_map(|c| self.catalog.shift(&c.shift_id))
            .collect();

        let nearest = nearest_by_start(case.in_time.time(), &shifts).ok_or_else(|| {
            EngineError::InvalidCorrection {
                employee_number: case.employee_number.clone(),
                date: case.date,
                message: "the case has no candidate shifts to choose from".to_string(),
            }
        })?;

        self.resolve_ambiguous_case(
            case_id,
            &nearest.id,
            reviewed_by,
            Some(format!(
                "Auto-assigned nearest candidate {} by start time",
                nearest.name
            )),
        )
    }

    /// Corrects the OUT of a daily record.
    ///
    /// `out_time` is a clock time on the record's date; when it is not
    /// after the IN it is taken as the next day. A record with a shift is
    /// re-derived against that shift; one without is matched again. The
    /// record is locked and a pending case is closed once the day has a
    /// shift.
    ///
    /// # Returns
    ///
    /// The updated record, or `RecordNotFound`, or `InvalidCorrection` if
    /// the record has no IN.
    pub fn correct_out_time(
        &self,
        employee_number: &str,
        date: NaiveDate,
        out_time: NaiveTime,
        corrected_by: &str,
    ) -> EngineResult<DailyAttendanceRecord> {
        let start_time = Instant::now();
        let employee_number = normalize_employee_number(employee_number);
        let employee = self.employee_profile(&employee_number)?;

        let record = self.locks.with_lock(&employee_number, || {
            let mut record = self.existing_record(&employee_number, date)?;
            let in_time = record.in_time.ok_or_else(|| EngineError::InvalidCorrection {
                employee_number: employee_number.clone(),
                date,
                message: "the record has no in-time to correct against".to_string(),
            })?;

            let mut corrected = in_time.date().and_time(out_time);
            if corrected <= in_time {
                corrected += Duration::days(1);
            }
            record.out_time = Some(corrected);
            record.merge_sources(&[PunchSource::Manual]);
            record.locked = true;

            let mut trace = DerivationTrace::default();
            match record.shift_id.clone() {
                Some(shift_id) => {
                    let shift = self.shift_definition(&shift_id)?;
                    self.rederive_with_shift(&mut record, &shift, &mut trace)?;
                    self.store.upsert_daily_record(record.clone())?;
                    self.close_pending_case(
                        &record,
                        corrected_by,
                        Some("Out-time corrected".to_string()),
                    )?;
                }
                None => {
                    let outcome = self.derive_day(&employee, &mut record, &mut trace)?;
                    self.store.upsert_daily_record(record.clone())?;
                    self.sync_case(&record, &outcome, corrected_by)?;
                }
            }
            Ok(record)
        })?;

        self.recompute_months(&employee_number, [YearMonth::from_date(date)]);

        info!(
            employee_number = %employee_number,
            date = %date,
            out_time = ?record.out_time,
            corrected_by = %corrected_by,
            duration_us = start_time.elapsed().as_micros(),
            "Corrected out-time"
        );
        Ok(record)
    }

    /// Assigns a shift to a daily record by hand.
    ///
    /// The record is re-derived against the shift, locked, and any pending
    /// case for the day is closed as resolved.
    pub fn assign_shift(
        &self,
        employee_number: &str,
        date: NaiveDate,
        shift_id: &str,
        assigned_by: &str,
    ) -> EngineResult<DailyAttendanceRecord> {
        let employee_number = normalize_employee_number(employee_number);
        let shift = self.shift_definition(shift_id)?;

        let record = self.assign_and_lock(
            &employee_number,
            date,
            &shift,
            assigned_by,
            Some("Shift assigned manually".to_string()),
        )?;

        info!(
            employee_number = %employee_number,
            date = %date,
            shift_id = %shift.id,
            assigned_by = %assigned_by,
            roster_deviation = record.is_roster_deviation,
            "Assigned shift"
        );
        Ok(record)
    }
}
