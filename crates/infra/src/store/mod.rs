//! Datastore boundary.
//!
//! A unit of work runs against a private copy of the committed state and is
//! published by a single `commit`. Commits are optimistic: a transaction whose
//! base revision is no longer current is rejected with `StoreError::Conflict`.

pub mod in_memory;
pub mod state;
pub mod r#trait;

pub use in_memory::InMemoryDatastore;
pub use r#trait::{Datastore, StoreError, Transaction};
pub use state::{StoreState, Table};

use tracing::{debug, warn};

use crate::error::CommandError;

/// Run `work` as one atomic unit of work.
///
/// Any error returned by `work` drops the transaction, leaving committed state
/// untouched. A conflicting commit re-runs `work` against fresh state up to
/// `max_retries` times.
pub(crate) fn atomically<S, T, F>(
    store: &S,
    operation: &'static str,
    max_retries: u32,
    mut work: F,
) -> Result<T, CommandError>
where
    S: Datastore + ?Sized,
    F: FnMut(&mut StoreState) -> Result<T, CommandError>,
{
    let mut attempt: u32 = 0;
    loop {
        let mut tx = store.begin()?;
        let out = work(tx.state_mut())?;

        match store.commit(tx) {
            Ok(revision) => {
                debug!(operation, revision, attempt, "unit of work committed");
                return Ok(out);
            }
            Err(StoreError::Conflict(msg)) if attempt < max_retries => {
                attempt += 1;
                warn!(operation, attempt, max_retries, error = %msg, "commit conflict, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }
}
