//! Product catalog reads and sale-price changes.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use stockledger_products::{PriceHistoryEntry, Product, ProductId};

use crate::error::CommandError;
use crate::store::{atomically, Datastore};

/// Catalog access outside the coordinator.
///
/// Reads are served from a snapshot. `set_sale_price` is its own unit of work
/// and only touches the list price and the price history; stock balances and
/// average cost change only through [`crate::TransactionCoordinator`].
#[derive(Debug, Clone)]
pub struct ProductCatalog<S> {
    store: S,
    max_conflict_retries: u32,
}

impl<S> ProductCatalog<S>
where
    S: Datastore,
{
    pub fn new(store: S, max_conflict_retries: u32) -> Self {
        Self {
            store,
            max_conflict_retries,
        }
    }

    pub fn get(&self, id: ProductId) -> Result<Product, CommandError> {
        let snapshot = self.store.snapshot()?;
        Ok(snapshot.product(id)?.clone())
    }

    /// Every product, by name.
    pub fn list(&self) -> Result<Vec<Product>, CommandError> {
        let snapshot = self.store.snapshot()?;
        let mut products: Vec<Product> = snapshot.products().values().cloned().collect();
        products.sort_by(|a, b| a.name().cmp(b.name()).then(a.id_typed().cmp(&b.id_typed())));
        Ok(products)
    }

    /// Price changes of a product, newest first.
    pub fn price_history(&self, id: ProductId) -> Result<Vec<PriceHistoryEntry>, CommandError> {
        let snapshot = self.store.snapshot()?;
        snapshot.product(id)?;
        Ok(snapshot.price_history_of(id))
    }

    /// Change the list price and record the change. Stock and ledger are not
    /// touched. Concurrent changes are last-write-wins, each with its own entry.
    pub fn set_sale_price(&self, id: ProductId, new_price: Decimal) -> Result<PriceHistoryEntry, CommandError> {
        let entry = atomically(&self.store, "set_sale_price", self.max_conflict_retries, |state| {
            let entry = state.product_mut(id)?.set_sale_price(new_price, Utc::now())?;
            state.price_history.push(entry.clone());
            Ok(entry)
        })?;

        info!(
            product_id = %id,
            previous_price = %entry.previous_price,
            new_price = %entry.new_price,
            "sale price changed"
        );
        Ok(entry)
    }
}
