//! Inventory domain module.
//!
//! The stock movement ledger model: immutable signed movements tagged with the
//! operation that produced them, filters for audit/replay queries, and the
//! replay formula reconciliation is built on. Pure domain logic (no IO).

pub mod movement;
pub mod query;
pub mod replay;

pub use movement::{Movement, MovementId, MovementKind, MovementSource, NewMovement};
pub use query::{MovementFilter, MovementOrder};
pub use replay::LedgerBreakdown;
