//! External collaborators consumed by the engine.
//!
//! The shift catalog and the approval source are owned by other systems.
//! The engine only reads them, through the [`ShiftCatalog`] and
//! [`ApprovalSource`] traits. In-memory implementations ship with the crate.

mod approvals;
mod catalog;

pub use approvals::{ApprovalSource, InMemoryApprovals};
pub use catalog::{ShiftCatalog, StaticShiftCatalog};
