//! Ambiguous shift case model.
//!
//! When the matcher cannot settle on exactly one shift it raises an
//! [`AmbiguousShiftCase`] for human review instead of guessing silently.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Review state of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Awaiting review.
    Pending,
    /// A shift was chosen.
    Resolved,
    /// Closed without changing the record.
    Dismissed,
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CaseStatus::Pending => "pending",
            CaseStatus::Resolved => "resolved",
            CaseStatus::Dismissed => "dismissed",
        })
    }
}

/// Why the matcher could not settle on one shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityReason {
    /// No candidate window contained the IN time.
    NoWindowMatched,
    /// Several windows matched and there is no OUT to disambiguate.
    MissingOutTime,
    /// Several windows matched and no end time was within tolerance of the OUT.
    NoEndTimeWithinTolerance,
    /// Several windows matched and more than one end time was within tolerance.
    MultipleEndTimesWithinTolerance,
}

/// A shift the reviewer may choose, with the reason it is offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateShift {
    /// The shift ID.
    pub shift_id: String,
    /// The shift name.
    pub shift_name: String,
    /// Shift start time of day.
    pub start_time: NaiveTime,
    /// Shift end time of day.
    pub end_time: NaiveTime,
    /// Why this shift is a candidate.
    pub match_reason: String,
}

/// Audit of how a case was closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResolution {
    /// Chosen shift, `None` for dismissals.
    pub shift_id: Option<String>,
    /// Who closed the case.
    pub reviewed_by: String,
    /// Reviewer comments.
    pub comments: Option<String>,
    /// When the case was closed.
    pub reviewed_at: DateTime<Utc>,
}

/// A pending or closed shift ambiguity for one employee-day.
///
/// At most one pending case exists per (employee, date); it is keyed
/// identically to the daily record it annotates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousShiftCase {
    /// Case identifier.
    pub id: Uuid,
    /// The employee number.
    pub employee_number: String,
    /// The shift date.
    pub date: NaiveDate,
    /// The interval's IN.
    pub in_time: NaiveDateTime,
    /// The interval's OUT, if paired.
    pub out_time: Option<NaiveDateTime>,
    /// Shifts the reviewer may choose from.
    pub candidates: Vec<CandidateShift>,
    /// Why the matcher stopped.
    pub reason: AmbiguityReason,
    /// Human-readable explanation.
    pub rationale: String,
    /// False when a best-effort shift was already assigned.
    pub requires_manual_selection: bool,
    /// The best-effort shift assigned while the case is pending.
    pub provisional_shift_id: Option<String>,
    /// Review state.
    pub status: CaseStatus,
    /// Set once the case is closed.
    pub resolution: Option<CaseResolution>,
    /// When the case was first raised.
    pub created_at: DateTime<Utc>,
}

impl AmbiguousShiftCase {
    /// Returns true while the case awaits review.
    pub fn is_pending(&self) -> bool {
        self.status == CaseStatus::Pending
    }

    /// Closes the case with the given status and audit data.
    pub fn close(
        &mut self,
        status: CaseStatus,
        shift_id: Option<String>,
        reviewed_by: impl Into<String>,
        comments: Option<String>,
    ) {
        self.status = status;
        self.resolution = Some(CaseResolution {
            shift_id,
            reviewed_by: reviewed_by.into(),
            comments,
            reviewed_at: Utc::now(),
        });
    }
}
