//! Per-employee serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{EngineError, EngineResult};

/// One mutex per employee.
///
/// Everything that reads, derives and writes an employee's daily records
/// runs while holding that employee's mutex. Different employees never
/// contend.
#[derive(Debug, Default)]
pub(crate) struct EmployeeLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EmployeeLocks {
    /// Runs `work` while holding the employee's mutex.
    ///
    /// The mutex is not reentrant; `work` must not call back into another
    /// locking operation for the same employee.
    pub(crate) fn with_lock<T>(
        &self,
        employee_number: &str,
        work: impl FnOnce() -> EngineResult<T>,
    ) -> EngineResult<T> {
        let lock = {
            let mut locks = self.locks.lock().map_err(|e| EngineError::Store {
                message: format!("lock table poisoned: {}", e),
            })?;
            Arc::clone(locks.entry(employee_number.to_string()).or_default())
        };

        let _guard = lock.lock().map_err(|e| EngineError::Store {
            message: format!("lock for employee '{}' poisoned: {}", employee_number, e),
        })?;
        work()
    }
}
