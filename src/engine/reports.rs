//! Reports returned by engine operations.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::DerivationTrace;

/// Outcome of ingesting a batch of raw punches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Punches stored.
    pub accepted: usize,
    /// Exact duplicates ignored.
    pub duplicates: usize,
    /// Punches that failed validation.
    pub rejected: usize,
    /// One message per rejected punch.
    pub errors: Vec<String>,
    /// Employees with at least one accepted punch.
    pub employees: Vec<String>,
}

/// Outcome of pairing and resolving one employee's date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRunReport {
    /// The employee.
    pub employee_number: String,
    /// First shift date of the range.
    pub from: NaiveDate,
    /// Last shift date of the range.
    pub to: NaiveDate,
    /// Daily records created or updated.
    pub records_written: usize,
    /// Days skipped because their record is locked.
    pub skipped_locked: usize,
    /// Ambiguous cases newly raised.
    pub cases_raised: usize,
    /// Pending cases refreshed with new data.
    pub cases_updated: usize,
    /// Pending cases closed because the day now resolves on its own.
    pub cases_auto_resolved: usize,
    /// OUTs no IN claimed.
    pub unmatched_outs: Vec<NaiveDateTime>,
    /// Shift dates that could not be derived or written; other dates
    /// in the range are still processed.
    pub day_failures: Vec<DayFailure>,
    /// Monthly recomputes that failed after the records were written.
    pub recompute_failures: Vec<String>,
    /// Derivation trace per shift date.
    pub traces: BTreeMap<NaiveDate, DerivationTrace>,
}

impl DayRunReport {
    pub(crate) fn new(employee_number: &str, from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            employee_number: employee_number.to_string(),
            from,
            to,
            records_written: 0,
            skipped_locked: 0,
            cases_raised: 0,
            cases_updated: 0,
            cases_auto_resolved: 0,
            unmatched_outs: Vec::new(),
            day_failures: Vec::new(),
            recompute_failures: Vec::new(),
            traces: BTreeMap::new(),
        }
    }

    pub(crate) fn record_day_failure(&mut self, date: NaiveDate, message: impl Into<String>) {
        self.day_failures.push(DayFailure {
            date,
            message: message.into(),
        });
    }
}

/// A shift date that failed inside a [`DayRunReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayFailure {
    /// The shift date.
    pub date: NaiveDate,
    /// What went wrong.
    pub message: String,
}

/// One failed item of a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemError {
    /// The item that failed, usually an employee number.
    pub key: String,
    /// What went wrong.
    pub message: String,
}

/// Aggregate outcome of a batch run.
///
/// A failing item never aborts the run; it is counted and reported here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Items attempted.
    pub processed: usize,
    /// Items that completed.
    pub succeeded: usize,
    /// Items that failed.
    pub failed: usize,
    /// Per-item failures, in key order.
    pub errors: Vec<BatchItemError>,
}

impl BatchReport {
    pub(crate) fn record_success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
    }

    pub(crate) fn record_failure(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.processed += 1;
        self.failed += 1;
        self.errors.push(BatchItemError {
            key: key.into(),
            message: message.into(),
        });
    }
}
