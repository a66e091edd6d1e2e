//! Monthly recompute, approval hooks and record upkeep.

use chrono::NaiveDate;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::calculation::{MonthlyInputs, aggregate_month, normalize_employee_number};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    ApprovedLeave, ApprovedOd, ApprovedOvertime, ApprovedPermission, AttendanceStatus,
    DailyAttendanceRecord, DerivationTrace, MonthlyAttendanceSummary, NonWorkingDay, YearMonth,
};

use super::AttendanceEngine;

impl AttendanceEngine {
    /// Rebuilds and replaces the monthly summary of an employee.
    ///
    /// # Returns
    ///
    /// The new summary, or `RecomputeFailed` wrapping the underlying error.
    pub fn recompute_monthly_summary(
        &self,
        employee_number: &str,
        month: YearMonth,
    ) -> EngineResult<MonthlyAttendanceSummary> {
        let employee_number = normalize_employee_number(employee_number);
        let failed = |err: EngineError| EngineError::RecomputeFailed {
            employee_number: employee_number.clone(),
            month: month.to_string(),
            message: err.to_string(),
        };

        let (from, to) = (month.first_day(), month.last_day());
        let records = self
            .store
            .daily_records(&employee_number, from, to)
            .map_err(failed)?;
        let leaves = self
            .approvals
            .leaves(&employee_number, from, to)
            .map_err(failed)?;
        let ods = self
            .approvals
            .ods(&employee_number, from, to)
            .map_err(failed)?;
        let overtime = self
            .approvals
            .overtime(&employee_number, from, to)
            .map_err(failed)?;
        let permissions = self
            .approvals
            .permissions(&employee_number, from, to)
            .map_err(failed)?;

        let summary = aggregate_month(
            &employee_number,
            month,
            &MonthlyInputs {
                records: &records,
                leaves: &leaves,
                ods: &ods,
                overtime: &overtime,
                permissions: &permissions,
            },
            &self.config.early_out,
        );
        self.store
            .replace_summary(summary.clone())
            .map_err(failed)?;

        debug!(
            employee_number = %employee_number,
            month = %month,
            present_days = summary.total_present_days,
            payable_shifts = %summary.total_payable_shifts,
            "Recomputed monthly summary"
        );
        Ok(summary)
    }

    /// Recomputes several months, logging and collecting failures.
    pub(super) fn recompute_months(
        &self,
        employee_number: &str,
        months: impl IntoIterator<Item = YearMonth>,
    ) -> Vec<String> {
        months
            .into_iter()
            .filter_map(|month| {
                self.recompute_monthly_summary(employee_number, month)
                    .err()
                    .map(|err| {
                        warn!(
                            employee_number = %employee_number,
                            month = %month,
                            error = %err,
                            "Monthly recompute failed"
                        );
                        err.to_string()
                    })
            })
            .collect()
    }

    pub(super) fn recompute_touched(
        &self,
        employee_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<MonthlyAttendanceSummary>> {
        YearMonth::months_touched(from, to)
            .into_iter()
            .map(|month| self.recompute_monthly_summary(employee_number, month))
            .collect()
    }

    /// Re-reads approved hours for existing records in a range and
    /// recalculates their metrics. Locked records are included: approvals
    /// change their hours, not their punches or shift.
    pub(super) fn refresh_records(
        &self,
        employee_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<usize> {
        self.locks.with_lock(employee_number, || {
            let mut changed = 0;
            for record in self.store.daily_records(employee_number, from, to)? {
                let mut updated = record.clone();
                self.refresh_external_hours(&mut updated)?;
                if updated.in_time.is_some() {
                    self.apply_metrics(&mut updated, &mut DerivationTrace::default())?;
                }
                if updated != record {
                    self.store.upsert_daily_record(updated)?;
                    changed += 1;
                }
            }
            Ok(changed)
        })
    }

    /// Hook for a leave that became approved.
    ///
    /// Recomputes every month the leave touches.
    pub fn on_leave_approved(
        &self,
        leave: &ApprovedLeave,
    ) -> EngineResult<Vec<MonthlyAttendanceSummary>> {
        info!(
            employee_number = %leave.employee_number,
            from = %leave.from_date,
            to = %leave.to_date,
            "Leave approved"
        );
        self.recompute_touched(&leave.employee_number, leave.from_date, leave.to_date)
    }

    /// Hook for an OD that became approved.
    ///
    /// OD hours feed the half-day threshold, so records in the range are
    /// re-measured before every touched month is recomputed.
    pub fn on_od_approved(&self, od: &ApprovedOd) -> EngineResult<Vec<MonthlyAttendanceSummary>> {
        let changed = self.refresh_records(&od.employee_number, od.from_date, od.to_date)?;
        info!(
            employee_number = %od.employee_number,
            from = %od.from_date,
            to = %od.to_date,
            records_changed = changed,
            "OD approved"
        );
        self.recompute_touched(&od.employee_number, od.from_date, od.to_date)
    }

    /// Hook for approved overtime.
    ///
    /// The day's extra hours are cleared in favour of the overtime.
    pub fn on_overtime_approved(
        &self,
        overtime: &ApprovedOvertime,
    ) -> EngineResult<MonthlyAttendanceSummary> {
        let changed =
            self.refresh_records(&overtime.employee_number, overtime.date, overtime.date)?;
        info!(
            employee_number = %overtime.employee_number,
            date = %overtime.date,
            hours = %overtime.hours,
            records_changed = changed,
            "Overtime approved"
        );
        self.recompute_monthly_summary(
            &overtime.employee_number,
            YearMonth::from_date(overtime.date),
        )
    }

    /// Hook for an approved permission.
    pub fn on_permission_approved(
        &self,
        permission: &ApprovedPermission,
    ) -> EngineResult<MonthlyAttendanceSummary> {
        info!(
            employee_number = %permission.employee_number,
            date = %permission.date,
            hours = %permission.hours,
            "Permission approved"
        );
        self.recompute_monthly_summary(
            &permission.employee_number,
            YearMonth::from_date(permission.date),
        )
    }

    /// Creates a record for every active employee without one on `date`.
    ///
    /// The status follows the roster: WEEK_OFF or HOLIDAY on a non-working
    /// day, ABSENT otherwise. Existing records are never touched.
    ///
    /// # Returns
    ///
    /// The records created.
    pub fn ensure_daily_records(&self, date: NaiveDate) -> EngineResult<Vec<DailyAttendanceRecord>> {
        let start_time = Instant::now();
        let mut created = Vec::new();

        for employee in self.catalog.active_employees() {
            let employee_number = employee.employee_number.as_str();
            let record = self.locks.with_lock(employee_number, || {
                if self.store.daily_record(employee_number, date)?.is_some() {
                    return Ok(None);
                }
                let status = match self.non_working_day(employee_number, date) {
                    Some(NonWorkingDay::WeekOff) => AttendanceStatus::WeekOff,
                    Some(NonWorkingDay::Holiday) => AttendanceStatus::Holiday,
                    None => AttendanceStatus::Absent,
                };
                let mut record = DailyAttendanceRecord::new(employee_number, date, status);
                self.refresh_external_hours(&mut record)?;
                self.store.upsert_daily_record(record.clone())?;
                Ok(Some(record))
            })?;

            if let Some(record) = record {
                self.recompute_months(employee_number, [YearMonth::from_date(date)]);
                created.push(record);
            }
        }

        info!(
            date = %date,
            created = created.len(),
            duration_us = start_time.elapsed().as_micros(),
            "Ensured daily records"
        );
        Ok(created)
    }
}
