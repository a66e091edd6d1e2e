//! The attendance engine.
//!
//! [`AttendanceEngine`] wires the pure derivation stages to the catalog,
//! the approval source and the store. Every operation that writes daily
//! records holds the employee's mutex for the read-derive-write section, and
//! then recomputes the affected monthly summaries. A failed recompute is
//! logged and reported but never undoes the write that triggered it.
//!
//! Batch operations (`sync_range`, `recompute_all`, `refresh_extra_hours`)
//! fan out one blocking task per employee and report per-employee failures
//! without aborting the run.

mod batch;
mod corrections;
mod locks;
mod pipeline;
mod recompute;
mod reports;

pub use reports::{BatchItemError, BatchReport, DayFailure, DayRunReport, IngestReport};

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::sources::{ApprovalSource, ShiftCatalog};
use crate::store::AttendanceStore;

use locks::EmployeeLocks;

/// Reviewer name recorded when the engine closes a case on its own.
pub const SYSTEM_REVIEWER: &str = "system";

/// The attendance derivation engine.
///
/// Cheap to clone; clones share the configuration, collaborators and
/// per-employee locks.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use attendance_engine::config::ConfigLoader;
/// use attendance_engine::engine::AttendanceEngine;
/// use attendance_engine::models::{PunchSource, RawPunch};
/// use attendance_engine::sources::{InMemoryApprovals, StaticShiftCatalog};
/// use attendance_engine::store::MemoryStore;
/// use chrono::NaiveDate;
///
/// let (config, catalog) = ConfigLoader::load("./config/default")?.into_parts();
/// let engine = AttendanceEngine::new(
///     config,
///     Arc::new(StaticShiftCatalog::from_config(catalog)),
///     Arc::new(InMemoryApprovals::new()),
///     Arc::new(MemoryStore::new()),
/// );
///
/// engine.ingest_punches(&[
///     RawPunch::new("E001", "2024-01-15 09:03:00", "IN", PunchSource::Device),
///     RawPunch::new("E001", "2024-01-15 18:05:00", "OUT", PunchSource::Device),
/// ])?;
/// let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// let report = engine.pair_and_resolve("E001", day, day)?;
/// println!("records written: {}", report.records_written);
/// # Ok::<(), attendance_engine::error::EngineError>(())
/// ```
#[derive(Clone)]
pub struct AttendanceEngine {
    config: Arc<EngineConfig>,
    catalog: Arc<dyn ShiftCatalog>,
    approvals: Arc<dyn ApprovalSource>,
    store: Arc<dyn AttendanceStore>,
    locks: Arc<EmployeeLocks>,
}

impl AttendanceEngine {
    /// Creates an engine over the given collaborators.
    pub fn new(
        config: EngineConfig,
        catalog: Arc<dyn ShiftCatalog>,
        approvals: Arc<dyn ApprovalSource>,
        store: Arc<dyn AttendanceStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            catalog,
            approvals,
            store,
            locks: Arc::new(EmployeeLocks::default()),
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the store.
    pub fn store(&self) -> &dyn AttendanceStore {
        self.store.as_ref()
    }

    /// Returns the shift catalog.
    pub fn catalog(&self) -> &dyn ShiftCatalog {
        self.catalog.as_ref()
    }
}
