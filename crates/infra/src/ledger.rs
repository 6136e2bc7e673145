//! Movement ledger over the datastore.
//!
//! Appends and removals happen inside a unit of work (`StoreState`); queries
//! run over an immutable snapshot and can be iterated any number of times.

use std::sync::Arc;

use stockledger_core::DomainResult;
use stockledger_inventory::{Movement, MovementFilter, MovementId, MovementOrder, MovementSource, NewMovement};

use crate::error::CommandError;
use crate::store::{Datastore, StoreState};

impl StoreState {
    /// Append one movement and assign its sequence number.
    ///
    /// The product must exist; zero quantities and signs that disagree with
    /// the kind are rejected.
    pub(crate) fn append_movement(&mut self, new: NewMovement) -> DomainResult<&Movement> {
        self.product(new.product_id)?;

        let sequence = self.last_sequence + 1;
        let movement = Movement::record(MovementId::generate(), sequence, new)?;
        self.last_sequence = sequence;

        let key = (movement.occurred_at, movement.sequence);
        let idx = self
            .movements
            .partition_point(|m| (m.occurred_at, m.sequence) <= key);
        self.movements.insert(idx, movement);
        Ok(&self.movements[idx])
    }

    /// Remove every movement produced by `source`. Returns the removed entries.
    pub(crate) fn remove_movements_for(&mut self, source: MovementSource) -> Vec<Movement> {
        let (removed, kept): (Vec<Movement>, Vec<Movement>) = std::mem::take(&mut self.movements)
            .into_iter()
            .partition(|m| m.source == source);
        self.movements = kept;
        removed
    }

    /// All movements, ordered by `(occurred_at, sequence)` ascending.
    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    pub fn movements_matching<'a>(
        &'a self,
        filter: &'a MovementFilter,
        order: MovementOrder,
    ) -> Box<dyn Iterator<Item = &'a Movement> + 'a> {
        let matching = move |m: &&Movement| filter.matches(m);
        match order {
            MovementOrder::Ascending => Box::new(self.movements.iter().filter(matching)),
            MovementOrder::Descending => Box::new(self.movements.iter().rev().filter(matching)),
        }
    }
}

/// Result of a ledger query: a filter bound to one snapshot.
#[derive(Debug, Clone)]
pub struct MovementQuery {
    snapshot: Arc<StoreState>,
    filter: MovementFilter,
    order: MovementOrder,
}

impl MovementQuery {
    /// Fresh pass over the matching movements.
    pub fn iter(&self) -> impl Iterator<Item = &Movement> + '_ {
        self.snapshot.movements_matching(&self.filter, self.order)
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn to_vec(&self) -> Vec<Movement> {
        self.iter().cloned().collect()
    }

    /// Revision of the snapshot the query reads.
    pub fn revision(&self) -> u64 {
        self.snapshot.revision()
    }
}

/// Read side of the ledger.
#[derive(Debug, Clone)]
pub struct MovementLedger<S> {
    store: S,
}

impl<S> MovementLedger<S>
where
    S: Datastore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn query(&self, filter: MovementFilter, order: MovementOrder) -> Result<MovementQuery, CommandError> {
        Ok(MovementQuery {
            snapshot: self.store.snapshot()?,
            filter,
            order,
        })
    }
}
