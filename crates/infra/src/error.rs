//! Error surface of the infra layer.

use thiserror::Error;

use stockledger_core::{AggregateId, DomainError, StockPool};

use crate::store::StoreError;

/// Error returned by every coordinator operation and read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error(
        "insufficient {pool} stock for product {product}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product: AggregateId,
        pool: StockPool,
        requested: i64,
        available: i64,
    },

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// The unit of work kept losing optimistic commits.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The datastore could not complete the unit of work. Nothing was committed.
    #[error("storage failure: {0}")]
    StorageFailure(String),
}

impl CommandError {
    /// Only storage failures are worth retrying as-is; everything else is
    /// deterministic given the same input and state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CommandError::StorageFailure(_))
    }
}

impl From<DomainError> for CommandError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound { entity, id } => CommandError::NotFound { entity, id },
            DomainError::InsufficientStock {
                product,
                pool,
                requested,
                available,
            } => CommandError::InsufficientStock {
                product,
                pool,
                requested,
                available,
            },
            DomainError::InvalidQuantity(msg) => CommandError::InvalidQuantity(msg),
            DomainError::Validation(msg) => CommandError::Validation(msg),
            DomainError::Conflict(msg) => CommandError::Conflict(msg),
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) => CommandError::Conflict(msg),
            StoreError::Unavailable(msg) => CommandError::StorageFailure(msg),
        }
    }
}
