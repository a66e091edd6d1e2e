//! In-memory attendance store.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AmbiguousShiftCase, DailyAttendanceRecord, MonthlyAttendanceSummary, PunchEvent, PunchSource,
    YearMonth,
};

use super::AttendanceStore;

type RecordKey = (String, NaiveDate);

#[derive(Debug, Default)]
struct StoreData {
    punches: BTreeMap<String, BTreeMap<(NaiveDateTime, PunchSource), PunchEvent>>,
    records: BTreeMap<RecordKey, DailyAttendanceRecord>,
    cases: HashMap<Uuid, AmbiguousShiftCase>,
    pending: BTreeMap<RecordKey, Uuid>,
    summaries: BTreeMap<(String, YearMonth), MonthlyAttendanceSummary>,
}

/// A thread-safe store held in memory.
///
/// # Example
///
/// ```
/// use attendance_engine::models::{PunchDirection, PunchEvent, PunchSource};
/// use attendance_engine::store::{AttendanceStore, MemoryStore};
/// use chrono::NaiveDateTime;
///
/// let store = MemoryStore::new();
/// let punch = PunchEvent {
///     employee_number: "E001".to_string(),
///     timestamp: NaiveDateTime::parse_from_str("2024-01-15 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
///     direction: PunchDirection::In,
///     source: PunchSource::Device,
/// };
///
/// assert!(store.insert_punch(punch.clone()).unwrap());
/// assert!(!store.insert_punch(punch).unwrap());
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, StoreData>> {
        self.data.read().map_err(|e| EngineError::Store {
            message: format!("store lock poisoned: {}", e),
        })
    }

    fn write(&self) -> EngineResult<RwLockWriteGuard<'_, StoreData>> {
        self.data.write().map_err(|e| EngineError::Store {
            message: format!("store lock poisoned: {}", e),
        })
    }
}

fn key(employee_number: &str, date: NaiveDate) -> RecordKey {
    (employee_number.to_string(), date)
}

impl AttendanceStore for MemoryStore {
    fn insert_punch(&self, punch: PunchEvent) -> EngineResult<bool> {
        let mut data = self.write()?;
        let punches = data
            .punches
            .entry(punch.employee_number.clone())
            .or_default();
        let dedup_key = punch.dedup_key();
        if punches.contains_key(&dedup_key) {
            return Ok(false);
        }
        punches.insert(dedup_key, punch);
        Ok(true)
    }

    fn punches(
        &self,
        employee_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<PunchEvent>> {
        let data = self.read()?;
        Ok(data
            .punches
            .get(employee_number)
            .map(|punches| {
                punches
                    .values()
                    .filter(|p| from <= p.date() && p.date() <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn employees_with_punches(&self, from: NaiveDate, to: NaiveDate) -> EngineResult<Vec<String>> {
        let data = self.read()?;
        Ok(data
            .punches
            .iter()
            .filter(|(_, punches)| {
                punches
                    .values()
                    .any(|p| from <= p.date() && p.date() <= to)
            })
            .map(|(employee, _)| employee.clone())
            .collect())
    }

    fn daily_record(
        &self,
        employee_number: &str,
        date: NaiveDate,
    ) -> EngineResult<Option<DailyAttendanceRecord>> {
        let data = self.read()?;
        Ok(data.records.get(&key(employee_number, date)).cloned())
    }

    fn upsert_daily_record(&self, record: DailyAttendanceRecord) -> EngineResult<()> {
        let mut data = self.write()?;
        data.records
            .insert(key(&record.employee_number, record.date), record);
        Ok(())
    }

    fn daily_records(
        &self,
        employee_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<DailyAttendanceRecord>> {
        if to < from {
            return Ok(Vec::new());
        }
        let data = self.read()?;
        Ok(data
            .records
            .range(key(employee_number, from)..=key(employee_number, to))
            .map(|(_, record)| record.clone())
            .collect())
    }

    fn employees_with_records(&self, from: NaiveDate, to: NaiveDate) -> EngineResult<Vec<String>> {
        let data = self.read()?;
        let employees: BTreeSet<String> = data
            .records
            .keys()
            .filter(|(_, date)| from <= *date && *date <= to)
            .map(|(employee, _)| employee.clone())
            .collect();
        Ok(employees.into_iter().collect())
    }

    fn pending_case(
        &self,
        employee_number: &str,
        date: NaiveDate,
    ) -> EngineResult<Option<AmbiguousShiftCase>> {
        let data = self.read()?;
        Ok(data
            .pending
            .get(&key(employee_number, date))
            .and_then(|id| data.cases.get(id))
            .cloned())
    }

    fn case(&self, case_id: Uuid) -> EngineResult<Option<AmbiguousShiftCase>> {
        let data = self.read()?;
        Ok(data.cases.get(&case_id).cloned())
    }

    fn upsert_case(&self, case: AmbiguousShiftCase) -> EngineResult<()> {
        let mut data = self.write()?;
        let case_key = key(&case.employee_number, case.date);

        match data.pending.get(&case_key).copied() {
            Some(existing) if existing != case.id && case.is_pending() => {
                return Err(EngineError::Store {
                    message: format!(
                        "pending case {} already exists for employee '{}' on {}",
                        existing, case.employee_number, case.date
                    ),
                });
            }
            Some(existing) if existing == case.id && !case.is_pending() => {
                data.pending.remove(&case_key);
            }
            None if case.is_pending() => {
                data.pending.insert(case_key, case.id);
            }
            _ => {}
        }

        data.cases.insert(case.id, case);
        Ok(())
    }

    fn pending_cases(&self) -> EngineResult<Vec<AmbiguousShiftCase>> {
        let data = self.read()?;
        Ok(data
            .pending
            .values()
            .filter_map(|id| data.cases.get(id))
            .cloned()
            .collect())
    }

    fn replace_summary(&self, summary: MonthlyAttendanceSummary) -> EngineResult<()> {
        let mut data = self.write()?;
        data.summaries
            .insert((summary.employee_number.clone(), summary.month), summary);
        Ok(())
    }

    fn summary(
        &self,
        employee_number: &str,
        month: YearMonth,
    ) -> EngineResult<Option<MonthlyAttendanceSummary>> {
        let data = self.read()?;
        Ok(data
            .summaries
            .get(&(employee_number.to_string(), month))
            .cloned())
    }
}
