//! Configuration types for attendance derivation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files. Every section has a
//! `Default` matching the engine's built-in constants, so partial files are
//! accepted.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::models::{DeductionType, EmployeeProfile, RosterEntry, ShiftDefinition};

/// Punch pairing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// An OUT further than this from its IN is never paired with it.
    pub max_pairing_window_hours: u32,
    /// Punches dated before this day are rejected at ingestion.
    pub earliest_valid_date: NaiveDate,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            max_pairing_window_hours: 25,
            earliest_valid_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN),
        }
    }
}

/// Shift matching settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Grace period for shifts that do not configure their own.
    pub default_grace_period_minutes: u32,
    /// How close an OUT must be to a shift end to disambiguate.
    pub out_time_tolerance_minutes: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            default_grace_period_minutes: 15,
            out_time_tolerance_minutes: 30,
        }
    }
}

/// Day metrics settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// A day below this fraction of expected hours is a half day.
    pub half_day_threshold_ratio: Decimal,
    /// OD-hours equivalent of a half-day OD.
    pub od_half_day_hours: Decimal,
    /// OD-hours equivalent of a full-day OD.
    pub od_full_day_hours: Decimal,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            half_day_threshold_ratio: Decimal::new(70, 2),
            od_half_day_hours: Decimal::new(45, 1),
            od_full_day_hours: Decimal::from(9),
        }
    }
}

/// One early-out minute range and what it deducts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionRange {
    /// Inclusive lower bound in minutes.
    pub min_minutes: u32,
    /// Inclusive upper bound in minutes.
    pub max_minutes: u32,
    /// What the range deducts.
    pub deduction_type: DeductionType,
    /// Fixed amount for `custom_amount` ranges.
    #[serde(default)]
    pub deduction_amount: Option<Decimal>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Early-out deduction policy.
///
/// Disabled by default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarlyOutPolicy {
    /// Whether deductions apply at all.
    pub enabled: bool,
    /// Early-outs at or below this many minutes are tolerated.
    pub allowed_duration_minutes: u32,
    /// Early-outs below this many minutes are not considered.
    pub minimum_duration_minutes: u32,
    /// Deduction ranges, in any order.
    pub deduction_ranges: Vec<DeductionRange>,
}

impl EarlyOutPolicy {
    /// Validates the deduction ranges.
    ///
    /// Ranges must have `min <= max`, must not overlap, and custom-amount
    /// ranges need a positive amount.
    ///
    /// # Example
    ///
    /// ```
    /// use attendance_engine::config::{DeductionRange, EarlyOutPolicy};
    /// use attendance_engine::models::DeductionType;
    ///
    /// let policy = EarlyOutPolicy {
    ///     enabled: true,
    ///     allowed_duration_minutes: 0,
    ///     minimum_duration_minutes: 0,
    ///     deduction_ranges: vec![
    ///         DeductionRange { min_minutes: 0, max_minutes: 30, deduction_type: DeductionType::QuarterDay, deduction_amount: None, description: None },
    ///         DeductionRange { min_minutes: 20, max_minutes: 60, deduction_type: DeductionType::HalfDay, deduction_amount: None, description: None },
    ///     ],
    /// };
    /// assert!(policy.validate().is_err());
    /// ```
    pub fn validate(&self) -> EngineResult<()> {
        for range in &self.deduction_ranges {
            if range.min_minutes > range.max_minutes {
                return Err(EngineError::InvalidConfig {
                    field: "early_out.deduction_ranges".to_string(),
                    message: format!(
                        "range {}-{} has min greater than max",
                        range.min_minutes, range.max_minutes
                    ),
                });
            }
            if range.deduction_type == DeductionType::CustomAmount
                && range.deduction_amount.is_none_or(|amount| amount <= Decimal::ZERO)
            {
                return Err(EngineError::InvalidConfig {
                    field: "early_out.deduction_ranges".to_string(),
                    message: format!(
                        "range {}-{} needs a positive deduction_amount",
                        range.min_minutes, range.max_minutes
                    ),
                });
            }
        }

        let mut sorted: Vec<&DeductionRange> = self.deduction_ranges.iter().collect();
        sorted.sort_by_key(|r| r.min_minutes);
        for pair in sorted.windows(2) {
            if pair[1].min_minutes <= pair[0].max_minutes {
                return Err(EngineError::InvalidConfig {
                    field: "early_out.deduction_ranges".to_string(),
                    message: format!(
                        "ranges {}-{} and {}-{} overlap",
                        pair[0].min_minutes,
                        pair[0].max_minutes,
                        pair[1].min_minutes,
                        pair[1].max_minutes
                    ),
                });
            }
        }

        Ok(())
    }
}

/// The contents of engine.yaml.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Pairing settings.
    pub pairing: PairingConfig,
    /// Matching settings.
    pub matching: MatchingConfig,
    /// Metrics settings.
    pub metrics: MetricsConfig,
}

/// The complete engine configuration threaded through every stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pairing settings.
    pub pairing: PairingConfig,
    /// Matching settings.
    pub matching: MatchingConfig,
    /// Metrics settings.
    pub metrics: MetricsConfig,
    /// Early-out deduction policy.
    pub early_out: EarlyOutPolicy,
}

impl EngineConfig {
    /// Combines engine.yaml settings with an early-out policy.
    pub fn new(settings: EngineSettings, early_out: EarlyOutPolicy) -> Self {
        Self {
            pairing: settings.pairing,
            matching: settings.matching,
            metrics: settings.metrics,
            early_out,
        }
    }

    /// Validates values that parse but make no sense.
    pub fn validate(&self) -> EngineResult<()> {
        if self.pairing.max_pairing_window_hours == 0 {
            return Err(EngineError::InvalidConfig {
                field: "pairing.max_pairing_window_hours".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        let ratio = self.metrics.half_day_threshold_ratio;
        if ratio <= Decimal::ZERO || ratio > Decimal::ONE {
            return Err(EngineError::InvalidConfig {
                field: "metrics.half_day_threshold_ratio".to_string(),
                message: format!("{} is outside (0, 1]", ratio),
            });
        }
        if self.metrics.od_half_day_hours < Decimal::ZERO
            || self.metrics.od_full_day_hours < Decimal::ZERO
        {
            return Err(EngineError::InvalidConfig {
                field: "metrics".to_string(),
                message: "OD hour equivalents must not be negative".to_string(),
            });
        }
        self.early_out.validate()
    }
}

/// The contents of catalog.yaml: shifts, pools, employees and roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Every shift definition, active or not.
    pub shifts: Vec<ShiftDefinition>,
    /// Employee profiles.
    pub employees: Vec<EmployeeProfile>,
    /// Department code to shift IDs.
    pub department_shifts: HashMap<String, Vec<String>>,
    /// Designation code to shift IDs.
    pub designation_shifts: HashMap<String, Vec<String>>,
    /// Roster overrides.
    pub roster: Vec<RosterEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn range(min: u32, max: u32, deduction_type: DeductionType) -> DeductionRange {
        DeductionRange {
            min_minutes: min,
            max_minutes: max,
            deduction_type,
            deduction_amount: None,
            description: None,
        }
    }

    #[test]
    fn test_defaults_match_built_in_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.pairing.max_pairing_window_hours, 25);
        assert_eq!(
            config.pairing.earliest_valid_date,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
        assert_eq!(config.matching.default_grace_period_minutes, 15);
        assert_eq!(config.matching.out_time_tolerance_minutes, 30);
        assert_eq!(
            config.metrics.half_day_threshold_ratio,
            Decimal::from_str("0.70").unwrap()
        );
        assert!(!config.early_out.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let settings: EngineSettings =
            serde_yaml::from_str("matching:\n  out_time_tolerance_minutes: 45\n").unwrap();
        assert_eq!(settings.matching.out_time_tolerance_minutes, 45);
        assert_eq!(settings.matching.default_grace_period_minutes, 15);
        assert_eq!(settings.pairing.max_pairing_window_hours, 25);
    }

    #[test]
    fn test_non_overlapping_ranges_validate() {
        let policy = EarlyOutPolicy {
            enabled: true,
            allowed_duration_minutes: 5,
            minimum_duration_minutes: 10,
            deduction_ranges: vec![
                range(61, 120, DeductionType::HalfDay),
                range(10, 60, DeductionType::QuarterDay),
            ],
        };
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_touching_ranges_overlap() {
        let policy = EarlyOutPolicy {
            enabled: true,
            deduction_ranges: vec![
                range(10, 60, DeductionType::QuarterDay),
                range(60, 120, DeductionType::HalfDay),
            ],
            ..Default::default()
        };
        match policy.validate() {
            Err(EngineError::InvalidConfig { message, .. }) => {
                assert!(message.contains("overlap"));
            }
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_amount_requires_positive_amount() {
        let mut custom = range(10, 60, DeductionType::CustomAmount);
        custom.deduction_amount = Some(Decimal::ZERO);
        let policy = EarlyOutPolicy {
            enabled: true,
            deduction_ranges: vec![custom],
            ..Default::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_zero_pairing_window_is_invalid() {
        let mut config = EngineConfig::default();
        config.pairing.max_pairing_window_hours = 0;
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig { .. })
        ));
    }
}
