//! Error types for the Attendance Derivation Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while deriving attendance.
//!
//! Shift ambiguity is deliberately absent here: an interval that cannot be
//! resolved to a single shift is a normal matcher outcome, not a failure.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for the Attendance Derivation Engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use attendance_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/engine.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/engine.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value parsed but is semantically invalid.
    #[error("Invalid configuration value '{field}': {message}")]
    InvalidConfig {
        /// The configuration field that was invalid.
        field: String,
        /// A description of what made the value invalid.
        message: String,
    },

    /// A raw punch could not be accepted for pairing.
    #[error("Invalid punch for employee '{employee_number}': {message}")]
    InvalidPunch {
        /// The employee number the punch was recorded against.
        employee_number: String,
        /// A description of what made the punch invalid.
        message: String,
    },

    /// Employee was not found in the shift catalog.
    #[error("Employee not found: {employee_number}")]
    EmployeeNotFound {
        /// The employee number that was not found.
        employee_number: String,
    },

    /// Shift was not found in the shift catalog.
    #[error("Shift not found: {shift_id}")]
    ShiftNotFound {
        /// The shift ID that was not found.
        shift_id: String,
    },

    /// No daily attendance record exists for the employee and date.
    #[error("No attendance record for employee '{employee_number}' on {date}")]
    RecordNotFound {
        /// The employee number.
        employee_number: String,
        /// The calendar date of the missing record.
        date: NaiveDate,
    },

    /// Ambiguous shift case was not found.
    #[error("Ambiguous shift case not found: {case_id}")]
    CaseNotFound {
        /// The case ID that was not found.
        case_id: Uuid,
    },

    /// Ambiguous shift case was already resolved or dismissed.
    #[error("Ambiguous shift case {case_id} is already {status}")]
    CaseAlreadyClosed {
        /// The case ID.
        case_id: Uuid,
        /// The terminal status the case is in.
        status: String,
    },

    /// A manual correction was rejected.
    #[error("Invalid correction for employee '{employee_number}' on {date}: {message}")]
    InvalidCorrection {
        /// The employee number.
        employee_number: String,
        /// The date of the record being corrected.
        date: NaiveDate,
        /// A description of why the correction was rejected.
        message: String,
    },

    /// A monthly summary could not be recomputed.
    #[error("Failed to recompute summary for employee '{employee_number}' month {month}: {message}")]
    RecomputeFailed {
        /// The employee number.
        employee_number: String,
        /// The month label ("YYYY-MM").
        month: String,
        /// A description of the underlying failure.
        message: String,
    },

    /// The attendance store rejected an operation.
    #[error("Attendance store error: {message}")]
    Store {
        /// A description of the store failure.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/engine.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/engine.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_invalid_punch_displays_employee_and_message() {
        let error = EngineError::InvalidPunch {
            employee_number: "E001".to_string(),
            message: "missing timestamp".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid punch for employee 'E001': missing timestamp"
        );
    }

    #[test]
    fn test_record_not_found_displays_employee_and_date() {
        let error = EngineError::RecordNotFound {
            employee_number: "E001".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        };
        assert_eq!(
            error.to_string(),
            "No attendance record for employee 'E001' on 2024-01-15"
        );
    }

    #[test]
    fn test_shift_not_found_displays_id() {
        let error = EngineError::ShiftNotFound {
            shift_id: "GEN".to_string(),
        };
        assert_eq!(error.to_string(), "Shift not found: GEN");
    }

    #[test]
    fn test_case_already_closed_displays_status() {
        let case_id = Uuid::nil();
        let error = EngineError::CaseAlreadyClosed {
            case_id,
            status: "dismissed".to_string(),
        };
        assert_eq!(
            error.to_string(),
            format!("Ambiguous shift case {} is already dismissed", case_id)
        );
    }

    #[test]
    fn test_recompute_failed_displays_month() {
        let error = EngineError::RecomputeFailed {
            employee_number: "E001".to_string(),
            month: "2024-01".to_string(),
            message: "store unavailable".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to recompute summary for employee 'E001' month 2024-01: store unavailable"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_shift_not_found() -> EngineResult<()> {
            Err(EngineError::ShiftNotFound {
                shift_id: "NIGHT".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_shift_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
