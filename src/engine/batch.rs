//! Cross-employee batch runs.
//!
//! Each employee is processed in its own blocking task. Employees share
//! nothing but the store, so the tasks run in parallel; one employee's
//! failure is recorded in the [`BatchReport`] and the run continues.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::YearMonth;

use super::AttendanceEngine;
use super::reports::BatchReport;

impl AttendanceEngine {
    async fn fan_out<T, F>(&self, run_id: Uuid, keys: Vec<String>, work: F) -> BatchReport
    where
        T: Send + 'static,
        F: Fn(&AttendanceEngine, &str) -> EngineResult<T> + Send + Sync + 'static,
    {
        let work = Arc::new(work);
        let handles: Vec<(String, JoinHandle<EngineResult<T>>)> = keys
            .into_iter()
            .map(|key| {
                let engine = self.clone();
                let work = Arc::clone(&work);
                let task_key = key.clone();
                let handle = tokio::task::spawn_blocking(move || work(&engine, &task_key));
                (key, handle)
            })
            .collect();

        let mut report = BatchReport::default();
        for (key, handle) in handles {
            match handle.await {
                Ok(Ok(_)) => report.record_success(),
                Ok(Err(err)) => {
                    warn!(run_id = %run_id, key = %key, error = %err, "Batch item failed");
                    report.record_failure(key, err.to_string());
                }
                Err(err) => {
                    warn!(run_id = %run_id, key = %key, error = %err, "Batch task failed");
                    report.record_failure(key, format!("task failed: {}", err));
                }
            }
        }
        report
    }

    /// Pairs and resolves a date range for every employee with punches in it.
    ///
    /// # Returns
    ///
    /// A [`BatchReport`] with one item per employee, or a `Store` error if
    /// the employee list cannot be read. An employee with any failed shift
    /// date counts as a failed item; their other dates are still written.
    pub async fn sync_range(&self, from: NaiveDate, to: NaiveDate) -> EngineResult<BatchReport> {
        let run_id = Uuid::new_v4();
        let start_time = Instant::now();
        let employees = self.store.employees_with_punches(from, to)?;
        info!(
            run_id = %run_id,
            from = %from,
            to = %to,
            employees = employees.len(),
            "Starting range sync"
        );

        let report = self
            .fan_out(run_id, employees, move |engine, employee_number| {
                let day_report = engine.pair_and_resolve(employee_number, from, to)?;
                if day_report.day_failures.is_empty() {
                    return Ok(day_report);
                }
                let failures: Vec<String> = day_report
                    .day_failures
                    .iter()
                    .map(|f| format!("{}: {}", f.date, f.message))
                    .collect();
                Err(EngineError::CalculationError {
                    message: failures.join("; "),
                })
            })
            .await;

        info!(
            run_id = %run_id,
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            duration_us = start_time.elapsed().as_micros(),
            "Range sync completed"
        );
        Ok(report)
    }

    /// Recomputes a month for every active employee and every employee
    /// with records in that month.
    pub async fn recompute_all(&self, month: YearMonth) -> EngineResult<BatchReport> {
        let run_id = Uuid::new_v4();
        let start_time = Instant::now();
        let mut employees: BTreeSet<String> = self
            .catalog
            .active_employees()
            .into_iter()
            .map(|e| e.employee_number)
            .collect();
        employees.extend(
            self.store
                .employees_with_records(month.first_day(), month.last_day())?,
        );

        let report = self
            .fan_out(
                run_id,
                employees.into_iter().collect(),
                move |engine, employee_number| {
                    engine.recompute_monthly_summary(employee_number, month)
                },
            )
            .await;

        info!(
            run_id = %run_id,
            month = %month,
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            duration_us = start_time.elapsed().as_micros(),
            "Recompute-all completed"
        );
        Ok(report)
    }

    /// Re-measures every record in a date range and recomputes the months
    /// it touches.
    ///
    /// Picks up approved overtime and OD hours that arrived without a hook
    /// call, and clears extra hours that no longer qualify.
    pub async fn refresh_extra_hours(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<BatchReport> {
        let run_id = Uuid::new_v4();
        let start_time = Instant::now();
        let employees = self.store.employees_with_records(from, to)?;

        let report = self
            .fan_out(run_id, employees, move |engine, employee_number| {
                let changed = engine.refresh_records(employee_number, from, to)?;
                engine.recompute_touched(employee_number, from, to)?;
                Ok(changed)
            })
            .await;

        info!(
            run_id = %run_id,
            from = %from,
            to = %to,
            processed = report.processed,
            failed = report.failed,
            duration_us = start_time.elapsed().as_micros(),
            "Extra-hours refresh completed"
        );
        Ok(report)
    }
}
