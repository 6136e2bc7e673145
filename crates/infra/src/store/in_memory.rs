use std::sync::{Arc, RwLock};

use stockledger_core::ExpectedVersion;

use super::r#trait::{Datastore, StoreError, Transaction};
use super::state::StoreState;

/// In-memory datastore.
///
/// Intended for tests/dev. Snapshots are shared `Arc`s; a commit swaps in a
/// new state under a short write lock.
///
/// ## Cost
///
/// `begin` clones the whole [`StoreState`], movement ledger included, so every
/// unit of work costs O(ledger size) in time and memory. Readers only clone
/// the `Arc`.
///
/// ## Concurrency
///
/// Writers never wait on each other while preparing a change. The commit
/// compares the transaction's base revision with the current one and rejects
/// a stale transaction with [`StoreError::Conflict`]; a poisoned lock
/// surfaces as [`StoreError::Unavailable`].
#[derive(Debug, Default)]
pub struct InMemoryDatastore {
    committed: RwLock<Arc<StoreState>>,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("lock poisoned".to_string())
    }
}

impl Datastore for InMemoryDatastore {
    fn snapshot(&self) -> Result<Arc<StoreState>, StoreError> {
        let guard = self.committed.read().map_err(|_| Self::poisoned())?;
        Ok(Arc::clone(&guard))
    }

    fn begin(&self) -> Result<Transaction, StoreError> {
        let snapshot = self.snapshot()?;
        Ok(Transaction::new(&snapshot))
    }

    fn commit(&self, tx: Transaction) -> Result<u64, StoreError> {
        let mut guard = self.committed.write().map_err(|_| Self::poisoned())?;

        let current = guard.revision();
        ExpectedVersion(tx.base_revision())
            .check(current)
            .map_err(|e| StoreError::Conflict(e.to_string()))?;

        let mut next = tx.into_state();
        let revision = current + 1;
        next.set_revision(revision);
        *guard = Arc::new(next);
        Ok(revision)
    }
}
