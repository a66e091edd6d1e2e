//! Punch validation.
//!
//! Raw tuples are validated before they reach the store: the employee
//! number is normalised, the timestamp parsed and range-checked, and the
//! direction label mapped to a [`PunchDirection`].

use chrono::NaiveDateTime;

use crate::config::PairingConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{PunchDirection, PunchEvent, RawPunch};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Normalises an employee number to trimmed upper case.
pub fn normalize_employee_number(employee_number: &str) -> String {
    employee_number.trim().to_uppercase()
}

/// Maps a device direction label to a [`PunchDirection`].
///
/// Anything that is not recognisably IN or OUT (breaks, overtime pulses,
/// empty labels) becomes [`PunchDirection::Unknown`].
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::parse_direction;
/// use attendance_engine::models::PunchDirection;
///
/// assert_eq!(parse_direction("in"), PunchDirection::In);
/// assert_eq!(parse_direction("CHECK-OUT"), PunchDirection::Out);
/// assert_eq!(parse_direction("BREAK"), PunchDirection::Unknown);
/// ```
pub fn parse_direction(label: &str) -> PunchDirection {
    let normalized: String = label
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    match normalized.as_str() {
        "IN" | "I" | "CHECKIN" | "0" => PunchDirection::In,
        "OUT" | "O" | "CHECKOUT" | "1" => PunchDirection::Out,
        _ => PunchDirection::Unknown,
    }
}

/// Parses a timestamp in one of the accepted formats.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Validates a raw punch tuple.
///
/// # Arguments
///
/// * `raw` - The tuple as delivered by the source
/// * `config` - Pairing settings carrying the earliest valid date
///
/// # Returns
///
/// The validated [`PunchEvent`], or `InvalidPunch` if the employee number
/// is empty, the timestamp is missing or malformed, or the timestamp is
/// dated before the earliest valid date.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::validate_punch;
/// use attendance_engine::config::PairingConfig;
/// use attendance_engine::models::{PunchDirection, PunchSource, RawPunch};
///
/// let raw = RawPunch::new(" e001 ", "2024-01-15 09:02:00", "IN", PunchSource::Device);
/// let punch = validate_punch(&raw, &PairingConfig::default()).unwrap();
/// assert_eq!(punch.employee_number, "E001");
/// assert_eq!(punch.direction, PunchDirection::In);
/// ```
pub fn validate_punch(raw: &RawPunch, config: &PairingConfig) -> EngineResult<PunchEvent> {
    let employee_number = normalize_employee_number(&raw.employee_number);
    if employee_number.is_empty() {
        return Err(EngineError::InvalidPunch {
            employee_number: raw.employee_number.clone(),
            message: "employee number is empty".to_string(),
        });
    }

    let text = raw
        .timestamp
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| EngineError::InvalidPunch {
            employee_number: employee_number.clone(),
            message: "missing timestamp".to_string(),
        })?;

    let timestamp = parse_timestamp(text).ok_or_else(|| EngineError::InvalidPunch {
        employee_number: employee_number.clone(),
        message: format!("malformed timestamp '{}'", text),
    })?;

    if timestamp.date() < config.earliest_valid_date {
        return Err(EngineError::InvalidPunch {
            employee_number,
            message: format!(
                "timestamp {} is before {}",
                timestamp, config.earliest_valid_date
            ),
        });
    }

    let direction = raw
        .direction
        .as_deref()
        .map(parse_direction)
        .unwrap_or(PunchDirection::Unknown);

    Ok(PunchEvent {
        employee_number,
        timestamp,
        direction,
        source: raw.source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PunchSource;

    fn config() -> PairingConfig {
        PairingConfig::default()
    }

    #[test]
    fn test_accepts_iso_and_short_formats() {
        let iso = RawPunch::new("E001", "2024-01-15T09:02:10", "OUT", PunchSource::Import);
        let short = RawPunch::new("E001", "2024-01-15 09:02", "OUT", PunchSource::Import);

        let iso = validate_punch(&iso, &config()).unwrap();
        let short = validate_punch(&short, &config()).unwrap();

        assert_eq!(iso.timestamp.to_string(), "2024-01-15 09:02:10");
        assert_eq!(short.timestamp.to_string(), "2024-01-15 09:02:00");
        assert_eq!(short.direction, PunchDirection::Out);
    }

    #[test]
    fn test_rejects_empty_employee_number() {
        let raw = RawPunch::new("   ", "2024-01-15 09:02:00", "IN", PunchSource::Device);
        match validate_punch(&raw, &config()) {
            Err(EngineError::InvalidPunch { message, .. }) => {
                assert_eq!(message, "employee number is empty");
            }
            other => panic!("Expected InvalidPunch, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_missing_timestamp() {
        let raw = RawPunch {
            employee_number: "E001".to_string(),
            timestamp: None,
            direction: Some("IN".to_string()),
            source: PunchSource::Device,
        };
        match validate_punch(&raw, &config()) {
            Err(EngineError::InvalidPunch { message, .. }) => {
                assert_eq!(message, "missing timestamp");
            }
            other => panic!("Expected InvalidPunch, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_malformed_timestamp() {
        let raw = RawPunch::new("E001", "15/01/2024 9am", "IN", PunchSource::Device);
        assert!(matches!(
            validate_punch(&raw, &config()),
            Err(EngineError::InvalidPunch { .. })
        ));
    }

    #[test]
    fn test_rejects_timestamp_before_earliest_valid_date() {
        let raw = RawPunch::new("E001", "2019-12-31 23:59:59", "IN", PunchSource::Device);
        match validate_punch(&raw, &config()) {
            Err(EngineError::InvalidPunch { message, .. }) => {
                assert!(message.contains("before 2020-01-01"));
            }
            other => panic!("Expected InvalidPunch, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_direction_is_unknown() {
        let raw = RawPunch {
            employee_number: "E001".to_string(),
            timestamp: Some("2024-01-15 12:00:00".to_string()),
            direction: None,
            source: PunchSource::Device,
        };
        let punch = validate_punch(&raw, &config()).unwrap();
        assert_eq!(punch.direction, PunchDirection::Unknown);
    }
}
