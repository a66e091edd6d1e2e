//! Approved leave, OD, overtime and permission facts.

use chrono::NaiveDate;
use std::sync::RwLock;

use crate::error::{EngineError, EngineResult};
use crate::models::{ApprovedLeave, ApprovedOd, ApprovedOvertime, ApprovedPermission};

/// Read access to already-approved facts.
///
/// Every query is scoped to one employee and an inclusive date window.
pub trait ApprovalSource: Send + Sync {
    /// Leaves whose range overlaps the window.
    fn leaves(
        &self,
        employee_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ApprovedLeave>>;

    /// ODs whose range overlaps the window.
    fn ods(
        &self,
        employee_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ApprovedOd>>;

    /// Overtime dated inside the window.
    fn overtime(
        &self,
        employee_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ApprovedOvertime>>;

    /// Permissions dated inside the window.
    fn permissions(
        &self,
        employee_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ApprovedPermission>>;
}

#[derive(Debug, Default)]
struct Approvals {
    leaves: Vec<ApprovedLeave>,
    ods: Vec<ApprovedOd>,
    overtime: Vec<ApprovedOvertime>,
    permissions: Vec<ApprovedPermission>,
}

/// An approval source held in memory.
///
/// Approval workflows push their outcomes in with the `add_*` methods,
/// then call the matching engine hook.
#[derive(Debug, Default)]
pub struct InMemoryApprovals {
    inner: RwLock<Approvals>,
}

impl InMemoryApprovals {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an approved leave.
    pub fn add_leave(&self, leave: ApprovedLeave) -> EngineResult<()> {
        self.write(|a| a.leaves.push(leave))
    }

    /// Records an approved OD.
    pub fn add_od(&self, od: ApprovedOd) -> EngineResult<()> {
        self.write(|a| a.ods.push(od))
    }

    /// Records approved overtime.
    pub fn add_overtime(&self, overtime: ApprovedOvertime) -> EngineResult<()> {
        self.write(|a| a.overtime.push(overtime))
    }

    /// Records an approved permission.
    pub fn add_permission(&self, permission: ApprovedPermission) -> EngineResult<()> {
        self.write(|a| a.permissions.push(permission))
    }

    fn write(&self, f: impl FnOnce(&mut Approvals)) -> EngineResult<()> {
        let mut guard = self.inner.write().map_err(|e| EngineError::Store {
            message: format!("approval lock poisoned: {}", e),
        })?;
        f(&mut guard);
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Approvals) -> T) -> EngineResult<T> {
        let guard = self.inner.read().map_err(|e| EngineError::Store {
            message: format!("approval lock poisoned: {}", e),
        })?;
        Ok(f(&guard))
    }
}

fn overlaps(from: NaiveDate, to: NaiveDate, window_from: NaiveDate, window_to: NaiveDate) -> bool {
    from <= window_to && to >= window_from
}

impl ApprovalSource for InMemoryApprovals {
    fn leaves(
        &self,
        employee_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ApprovedLeave>> {
        self.read(|a| {
            a.leaves
                .iter()
                .filter(|l| {
                    l.employee_number == employee_number
                        && overlaps(l.from_date, l.to_date, from, to)
                })
                .cloned()
                .collect()
        })
    }

    fn ods(
        &self,
        employee_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ApprovedOd>> {
        self.read(|a| {
            a.ods
                .iter()
                .filter(|o| {
                    o.employee_number == employee_number
                        && overlaps(o.from_date, o.to_date, from, to)
                })
                .cloned()
                .collect()
        })
    }

    fn overtime(
        &self,
        employee_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ApprovedOvertime>> {
        self.read(|a| {
            a.overtime
                .iter()
                .filter(|o| o.employee_number == employee_number && from <= o.date && o.date <= to)
                .cloned()
                .collect()
        })
    }

    fn permissions(
        &self,
        employee_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ApprovedPermission>> {
        self.read(|a| {
            a.permissions
                .iter()
                .filter(|p| p.employee_number == employee_number && from <= p.date && p.date <= to)
                .cloned()
                .collect()
        })
    }
}
