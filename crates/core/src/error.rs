//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::AggregateId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Which stock balance of a product an operation draws from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockPool {
    OnHand,
    InConsignment,
}

impl core::fmt::Display for StockPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StockPool::OnHand => f.write_str("on-hand"),
            StockPool::InConsignment => f.write_str("in-consignment"),
        }
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. Storage and
/// transport failures belong to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The operation would drive a stock balance negative.
    #[error(
        "insufficient {pool} stock for product {product}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product: AggregateId,
        pool: StockPool,
        requested: i64,
        available: i64,
    },

    /// Non-positive quantity, or a quantity exceeding an outstanding balance.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Any other malformed input (blank names, negative amounts, empty drafts).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A concurrent write was detected (stale version).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn insufficient(product: AggregateId, pool: StockPool, requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            product,
            pool,
            requested,
            available,
        }
    }

    pub fn invalid_quantity(msg: impl Into<String>) -> Self {
        Self::InvalidQuantity(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_names_the_pool() {
        let product = AggregateId::new();
        let err = DomainError::insufficient(product, StockPool::InConsignment, 12, 4);
        let msg = err.to_string();
        assert!(msg.contains("in-consignment"));
        assert!(msg.contains("requested 12"));
        assert!(msg.contains("available 4"));
    }

    #[test]
    fn not_found_carries_entity_and_id() {
        let err = DomainError::not_found("sale", 42);
        assert_eq!(err.to_string(), "sale not found: 42");
    }
}
