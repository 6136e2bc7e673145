//! Replay of the movement ledger into expected balances.

use serde::{Deserialize, Serialize};

use crate::movement::{Movement, MovementKind};

/// Absolute units per movement family for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerBreakdown {
    pub purchases: i64,
    pub initial_stock: i64,
    pub direct_sales: i64,
    pub delivered: i64,
    pub returned: i64,
    pub settled: i64,
    pub movement_count: usize,
}

impl LedgerBreakdown {
    pub fn from_movements<'a>(movements: impl IntoIterator<Item = &'a Movement>) -> Self {
        movements.into_iter().fold(Self::default(), |mut acc, m| {
            acc.record(m);
            acc
        })
    }

    pub fn record(&mut self, movement: &Movement) {
        let units = movement.units();
        let bucket = match movement.kind {
            MovementKind::Purchase => &mut self.purchases,
            MovementKind::InitialStock => &mut self.initial_stock,
            MovementKind::Sale => &mut self.direct_sales,
            MovementKind::ConsignmentDelivery => &mut self.delivered,
            MovementKind::ConsignmentReturn => &mut self.returned,
            MovementKind::SaleConsignment => &mut self.settled,
        };
        *bucket += units;
        self.movement_count += 1;
    }

    pub fn expected_on_hand(&self) -> i64 {
        self.purchases + self.initial_stock - self.direct_sales - self.delivered + self.returned
    }

    /// Units still at consignee locations according to the ledger.
    pub fn expected_in_consignment(&self) -> i64 {
        self.delivered - self.returned - self.settled
    }
}
