//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! settings, the early-out policy and the seed shift catalog from YAML files.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::models::RosterAssignment;

use super::types::{CatalogConfig, EarlyOutPolicy, EngineConfig, EngineSettings};

/// Loads and provides access to engine configuration.
///
/// The `ConfigLoader` reads YAML configuration files from a directory,
/// validates them, and hands out the [`EngineConfig`] threaded through the
/// pipeline plus the catalog used to seed a static shift catalog.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/default/
/// ├── engine.yaml     # Pairing, matching and metrics settings
/// ├── early_out.yaml  # Early-out deduction policy
/// └── catalog.yaml    # Shifts, pools, employees and roster
/// ```
///
/// # Example
///
/// ```no_run
/// use attendance_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Grace period: {}", loader.config().matching.default_grace_period_minutes);
/// println!("Shifts: {}", loader.catalog().shifts.len());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
    catalog: CatalogConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/default")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - Any value fails validation (e.g. overlapping deduction ranges)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use attendance_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/default")?;
    /// # Ok::<(), attendance_engine::error::EngineError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<EngineSettings>(&path.join("engine.yaml"))?;
        let early_out = Self::load_yaml::<EarlyOutPolicy>(&path.join("early_out.yaml"))?;
        let catalog = Self::load_yaml::<CatalogConfig>(&path.join("catalog.yaml"))?;

        let config = EngineConfig::new(settings, early_out);
        config.validate()?;
        Self::validate_catalog(&catalog)?;

        info!(
            path = %path.display(),
            shifts = catalog.shifts.len(),
            employees = catalog.employees.len(),
            roster_entries = catalog.roster.len(),
            early_out_enabled = config.early_out.enabled,
            "Loaded attendance configuration"
        );

        Ok(Self { config, catalog })
    }

    /// Builds a loader from in-memory values, validating them the same way.
    pub fn from_parts(config: EngineConfig, catalog: CatalogConfig) -> EngineResult<Self> {
        config.validate()?;
        Self::validate_catalog(&catalog)?;
        Ok(Self { config, catalog })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Checks that every pool and roster entry points at a known shift.
    fn validate_catalog(catalog: &CatalogConfig) -> EngineResult<()> {
        let known = |id: &str| catalog.shifts.iter().any(|s| s.id == id);

        let pooled = catalog
            .department_shifts
            .values()
            .chain(catalog.designation_shifts.values())
            .flatten();
        for shift_id in pooled {
            if !known(shift_id) {
                return Err(EngineError::InvalidConfig {
                    field: "catalog.shift_pools".to_string(),
                    message: format!("unknown shift '{}'", shift_id),
                });
            }
        }

        for entry in &catalog.roster {
            let RosterAssignment::Shift { shift_id } = &entry.assignment else {
                continue;
            };
            if !known(shift_id) {
                return Err(EngineError::InvalidConfig {
                    field: "catalog.roster".to_string(),
                    message: format!(
                        "roster entry for {} on {} references unknown shift '{}'",
                        entry.employee_number, entry.date, shift_id
                    ),
                });
            }
        }

        Ok(())
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the seed catalog.
    pub fn catalog(&self) -> &CatalogConfig {
        &self.catalog
    }

    /// Splits the loader into its configuration and catalog.
    pub fn into_parts(self) -> (EngineConfig, CatalogConfig) {
        (self.config, self.catalog)
    }
}
