//! Core data models for the Attendance Derivation Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod ambiguous_case;
mod approvals;
mod daily_record;
mod derivation;
mod early_out;
mod month;
mod monthly_summary;
mod punch;
mod shift;

pub use ambiguous_case::{
    AmbiguityReason, AmbiguousShiftCase, CandidateShift, CaseResolution, CaseStatus,
};
pub use approvals::{ApprovedLeave, ApprovedOd, ApprovedOvertime, ApprovedPermission, OdKind};
pub use daily_record::{AttendanceStatus, DailyAttendanceRecord};
pub use derivation::{DerivationStep, DerivationTrace};
pub use early_out::{DeductionType, EarlyOutBreakdown, EarlyOutEvaluation};
pub use month::YearMonth;
pub use monthly_summary::MonthlyAttendanceSummary;
pub use punch::{PunchDirection, PunchEvent, PunchSource, RawPunch};
pub use shift::{
    EmployeeProfile, NonWorkingDay, RosterAssignment, RosterEntry, ShiftDefinition,
};
