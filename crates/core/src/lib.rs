//! `stockledger-core`: identifiers, domain errors and entity building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod quantity;
pub mod version;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, StockPool};
pub use id::{AggregateId, BrandId, ClientId, SupplierId};
pub use quantity::{checked_total, sum_by_key};
pub use version::ExpectedVersion;
