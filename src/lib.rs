//! Attendance Derivation Engine
//!
//! This crate turns raw, noisy clock-punch events into canonical per-day
//! attendance records (paired IN/OUT times, resolved shift, lateness and
//! extra-hours metrics, day status) and rolls those records together with
//! approved leave, OD, overtime and permission facts into monthly summaries.
//!
//! The pipeline runs in a fixed order:
//!
//! ```text
//! punches -> ingestion -> pairing -> shift matching -> metrics -> daily record -> monthly summary
//! ```
//!
//! Manual corrections re-enter at the matching stage and re-trigger the
//! monthly summary. See [`engine::AttendanceEngine`] for the entry points.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod sources;
pub mod store;
