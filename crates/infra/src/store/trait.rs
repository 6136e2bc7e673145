use std::sync::Arc;

use thiserror::Error;

use super::state::StoreState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The transaction's base revision is no longer current.
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    #[error("datastore unavailable: {0}")]
    Unavailable(String),
}

/// Private working copy of the committed state.
#[derive(Debug, Clone)]
pub struct Transaction {
    base_revision: u64,
    state: StoreState,
}

impl Transaction {
    pub fn new(base: &StoreState) -> Self {
        Self {
            base_revision: base.revision(),
            state: base.clone(),
        }
    }

    /// Revision of the committed state this transaction started from.
    pub fn base_revision(&self) -> u64 {
        self.base_revision
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StoreState {
        &mut self.state
    }

    pub fn into_state(self) -> StoreState {
        self.state
    }
}

/// Storage boundary for the ledger.
///
/// Implementations must:
/// - hand out snapshots that never change after being returned
/// - publish a transaction all-or-nothing
/// - reject a commit whose base revision is stale
pub trait Datastore: Send + Sync {
    /// Consistent read-only view of the committed state.
    fn snapshot(&self) -> Result<Arc<StoreState>, StoreError>;

    /// Start a unit of work from the current committed state.
    fn begin(&self) -> Result<Transaction, StoreError>;

    /// Publish a unit of work. Returns the new revision.
    fn commit(&self, tx: Transaction) -> Result<u64, StoreError>;
}

impl<S> Datastore for Arc<S>
where
    S: Datastore + ?Sized,
{
    fn snapshot(&self) -> Result<Arc<StoreState>, StoreError> {
        (**self).snapshot()
    }

    fn begin(&self) -> Result<Transaction, StoreError> {
        (**self).begin()
    }

    fn commit(&self, tx: Transaction) -> Result<u64, StoreError> {
        (**self).commit(tx)
    }
}
