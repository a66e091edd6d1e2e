//! Punch event models.
//!
//! A [`PunchEvent`] is one validated clock pulse. Raw tuples arrive as
//! [`RawPunch`] and are validated by
//! [`validate_punch`](crate::calculation::validate_punch) before storage.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Direction of a clock pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchDirection {
    /// Check-in pulse.
    In,
    /// Check-out pulse.
    Out,
    /// Break, overtime or unlabelled pulse. Stored but never paired.
    Unknown,
}

/// Where a punch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchSource {
    /// Biometric or card device feed.
    Device,
    /// Bulk import from a file.
    Import,
    /// Entered or corrected by a person.
    Manual,
}

/// A validated, immutable clock pulse.
///
/// Timestamps are local wall-clock times; calendar dates and
/// time-of-day comparisons are taken from them directly.
///
/// # Example
///
/// ```
/// use attendance_engine::models::{PunchDirection, PunchEvent, PunchSource};
/// use chrono::NaiveDateTime;
///
/// let punch = PunchEvent {
///     employee_number: "E001".to_string(),
///     timestamp: NaiveDateTime::parse_from_str("2024-01-15 09:02:00", "%Y-%m-%d %H:%M:%S").unwrap(),
///     direction: PunchDirection::In,
///     source: PunchSource::Device,
/// };
/// assert_eq!(punch.date().to_string(), "2024-01-15");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PunchEvent {
    /// Normalised (trimmed, upper-case) employee number.
    pub employee_number: String,
    /// Local wall-clock instant of the pulse.
    pub timestamp: NaiveDateTime,
    /// IN, OUT or unknown.
    pub direction: PunchDirection,
    /// Origin of the pulse.
    pub source: PunchSource,
}

impl PunchEvent {
    /// Calendar date of the pulse.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Key under which duplicate ingestion is detected.
    pub fn dedup_key(&self) -> (NaiveDateTime, PunchSource) {
        (self.timestamp, self.source)
    }
}

/// An unvalidated punch tuple as delivered by a device feed or import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPunch {
    /// Employee number as recorded by the source.
    pub employee_number: String,
    /// Timestamp text, e.g. "2024-01-15 09:02:00".
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Direction label, e.g. "IN", "OUT", "BREAK".
    #[serde(default)]
    pub direction: Option<String>,
    /// Origin of the pulse.
    pub source: PunchSource,
}

impl RawPunch {
    /// Convenience constructor for a fully populated tuple.
    pub fn new(
        employee_number: impl Into<String>,
        timestamp: impl Into<String>,
        direction: impl Into<String>,
        source: PunchSource,
    ) -> Self {
        Self {
            employee_number: employee_number.into(),
            timestamp: Some(timestamp.into()),
            direction: Some(direction.into()),
            source,
        }
    }
}
