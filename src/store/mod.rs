//! Attendance storage.
//!
//! The [`AttendanceStore`] trait covers everything the engine persists:
//! stored punches, daily records, ambiguous shift cases and monthly
//! summaries. Writes are keyed upserts, so replaying an operation leaves
//! the store unchanged.

mod memory;

pub use memory::MemoryStore;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{
    AmbiguousShiftCase, DailyAttendanceRecord, MonthlyAttendanceSummary, PunchEvent, YearMonth,
};

/// Persistence used by the engine.
///
/// Date ranges are inclusive on both ends.
pub trait AttendanceStore: Send + Sync {
    /// Stores a punch unless one with the same employee, timestamp and
    /// source already exists.
    ///
    /// # Returns
    ///
    /// `true` if the punch was new, `false` for a duplicate.
    fn insert_punch(&self, punch: PunchEvent) -> EngineResult<bool>;

    /// Punches for an employee dated within the range, in chronological order.
    fn punches(
        &self,
        employee_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<PunchEvent>>;

    /// Employees with at least one punch dated within the range.
    fn employees_with_punches(&self, from: NaiveDate, to: NaiveDate) -> EngineResult<Vec<String>>;

    /// The daily record for an employee on a date.
    fn daily_record(
        &self,
        employee_number: &str,
        date: NaiveDate,
    ) -> EngineResult<Option<DailyAttendanceRecord>>;

    /// Inserts or replaces the record for its (employee, date) key.
    fn upsert_daily_record(&self, record: DailyAttendanceRecord) -> EngineResult<()>;

    /// Daily records for an employee within the range, ordered by date.
    fn daily_records(
        &self,
        employee_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<DailyAttendanceRecord>>;

    /// Employees with at least one daily record within the range.
    fn employees_with_records(&self, from: NaiveDate, to: NaiveDate) -> EngineResult<Vec<String>>;

    /// The pending case for an (employee, date) key, if any.
    fn pending_case(
        &self,
        employee_number: &str,
        date: NaiveDate,
    ) -> EngineResult<Option<AmbiguousShiftCase>>;

    /// A case by ID, whatever its status.
    fn case(&self, case_id: Uuid) -> EngineResult<Option<AmbiguousShiftCase>>;

    /// Inserts or replaces a case.
    ///
    /// Fails if a different pending case already exists for the same key.
    fn upsert_case(&self, case: AmbiguousShiftCase) -> EngineResult<()>;

    /// Every pending case, ordered by employee and date.
    fn pending_cases(&self) -> EngineResult<Vec<AmbiguousShiftCase>>;

    /// Replaces the summary for its (employee, month) key.
    fn replace_summary(&self, summary: MonthlyAttendanceSummary) -> EngineResult<()>;

    /// The summary for an employee and month.
    fn summary(
        &self,
        employee_number: &str,
        month: YearMonth,
    ) -> EngineResult<Option<MonthlyAttendanceSummary>>;
}
