//! Shift catalog.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use crate::calculation::normalize_employee_number;
use crate::config::CatalogConfig;
use crate::models::{EmployeeProfile, RosterAssignment, ShiftDefinition};

/// Read access to shift reference data.
pub trait ShiftCatalog: Send + Sync {
    /// Looks up an employee profile.
    fn employee(&self, employee_number: &str) -> Option<EmployeeProfile>;

    /// Every active employee, ordered by employee number.
    fn active_employees(&self) -> Vec<EmployeeProfile>;

    /// Looks up a shift by ID, active or not.
    fn shift(&self, shift_id: &str) -> Option<ShiftDefinition>;

    /// Every active shift.
    fn active_shifts(&self) -> Vec<ShiftDefinition>;

    /// Shifts linked to a designation.
    fn designation_shifts(&self, designation: &str) -> Vec<ShiftDefinition>;

    /// Shifts linked to a department.
    fn department_shifts(&self, department: &str) -> Vec<ShiftDefinition>;

    /// The roster override for an employee on a date.
    fn roster_entry(&self, employee_number: &str, date: NaiveDate) -> Option<RosterAssignment>;
}

/// A shift catalog held in memory, typically seeded from catalog.yaml.
///
/// # Example
///
/// ```no_run
/// use attendance_engine::config::ConfigLoader;
/// use attendance_engine::sources::{ShiftCatalog, StaticShiftCatalog};
///
/// let loader = ConfigLoader::load("./config/default")?;
/// let catalog = StaticShiftCatalog::from_config(loader.catalog().clone());
/// assert!(catalog.shift("GEN").is_some());
/// # Ok::<(), attendance_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticShiftCatalog {
    shifts: Vec<ShiftDefinition>,
    employees: BTreeMap<String, EmployeeProfile>,
    department_shifts: HashMap<String, Vec<String>>,
    designation_shifts: HashMap<String, Vec<String>>,
    roster: HashMap<(String, NaiveDate), RosterAssignment>,
}

impl StaticShiftCatalog {
    /// Builds the catalog from its YAML form.
    ///
    /// Employee numbers are normalised; a later roster entry for the same
    /// employee and date replaces an earlier one.
    pub fn from_config(config: CatalogConfig) -> Self {
        let employees = config
            .employees
            .into_iter()
            .map(|mut e| {
                e.employee_number = normalize_employee_number(&e.employee_number);
                (e.employee_number.clone(), e)
            })
            .collect();

        let roster = config
            .roster
            .into_iter()
            .map(|r| {
                (
                    (normalize_employee_number(&r.employee_number), r.date),
                    r.assignment,
                )
            })
            .collect();

        Self {
            shifts: config.shifts,
            employees,
            department_shifts: config.department_shifts,
            designation_shifts: config.designation_shifts,
            roster,
        }
    }

    fn resolve(&self, ids: Option<&Vec<String>>) -> Vec<ShiftDefinition> {
        ids.map(|ids| ids.iter().filter_map(|id| self.shift(id)).collect())
            .unwrap_or_default()
    }
}

impl ShiftCatalog for StaticShiftCatalog {
    fn employee(&self, employee_number: &str) -> Option<EmployeeProfile> {
        self.employees.get(employee_number).cloned()
    }

    fn active_employees(&self) -> Vec<EmployeeProfile> {
        self.employees.values().filter(|e| e.active).cloned().collect()
    }

    fn shift(&self, shift_id: &str) -> Option<ShiftDefinition> {
        self.shifts.iter().find(|s| s.id == shift_id).cloned()
    }

    fn active_shifts(&self) -> Vec<ShiftDefinition> {
        self.shifts.iter().filter(|s| s.is_active).cloned().collect()
    }

    fn designation_shifts(&self, designation: &str) -> Vec<ShiftDefinition> {
        self.resolve(self.designation_shifts.get(designation))
    }

    fn department_shifts(&self, department: &str) -> Vec<ShiftDefinition> {
        self.resolve(self.department_shifts.get(department))
    }

    fn roster_entry(&self, employee_number: &str, date: NaiveDate) -> Option<RosterAssignment> {
        self.roster
            .get(&(employee_number.to_string(), date))
            .cloned()
    }
}
