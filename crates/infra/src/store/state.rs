use std::collections::HashMap;

use stockledger_consignment::{Consignment, ConsignmentLine, ConsignmentLineId};
use stockledger_core::{DomainError, DomainResult, Entity, StockPool};
use stockledger_inventory::Movement;
use stockledger_products::{PriceHistoryEntry, Product, ProductId, StockDelta};
use stockledger_purchasing::Purchase;
use stockledger_sales::Sale;

/// Rows of one entity type, keyed by id.
#[derive(Debug, Clone)]
pub struct Table<E: Entity> {
    rows: HashMap<E::Id, E>,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<E: Entity> Table<E> {
    pub fn get(&self, id: &E::Id) -> Option<&E> {
        self.rows.get(id)
    }

    pub fn get_mut(&mut self, id: &E::Id) -> Option<&mut E> {
        self.rows.get_mut(id)
    }

    pub fn contains(&self, id: &E::Id) -> bool {
        self.rows.contains_key(id)
    }

    /// Insert or replace by id.
    pub fn insert(&mut self, row: E) -> Option<E> {
        self.rows.insert(*row.id(), row)
    }

    pub fn remove(&mut self, id: &E::Id) -> Option<E> {
        self.rows.remove(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Unordered iteration.
    pub fn values(&self) -> impl Iterator<Item = &E> {
        self.rows.values()
    }
}

/// The whole persisted layout, plus the commit revision.
///
/// ## Tables
///
/// - `products`: catalog rows with both stock balances and average cost
/// - `movements`: the append-only ledger, sorted by `(occurred_at, sequence)`
/// - `sales`, `purchases`: documents owning their lines
/// - `consignments`: headers owning their outstanding lines; closed headers stay
/// - `price_history`: append-only list price changes
///
/// ## Invariants
///
/// Every line and movement references an existing product. After each commit
/// a product's on-hand stock equals the replay of its movements, and its
/// consignment stock equals the sum of its outstanding consignment lines.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub(crate) products: Table<Product>,
    /// Kept sorted by `(occurred_at, sequence)`.
    pub(crate) movements: Vec<Movement>,
    pub(crate) last_sequence: u64,
    pub(crate) sales: Table<Sale>,
    pub(crate) purchases: Table<Purchase>,
    pub(crate) consignments: Table<Consignment>,
    pub(crate) price_history: Vec<PriceHistoryEntry>,
    revision: u64,
}

impl StoreState {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    pub fn products(&self) -> &Table<Product> {
        &self.products
    }

    pub fn sales(&self) -> &Table<Sale> {
        &self.sales
    }

    pub fn purchases(&self) -> &Table<Purchase> {
        &self.purchases
    }

    pub fn consignments(&self) -> &Table<Consignment> {
        &self.consignments
    }

    pub fn price_history(&self) -> &[PriceHistoryEntry] {
        &self.price_history
    }

    pub fn product(&self, id: ProductId) -> DomainResult<&Product> {
        self.products
            .get(&id)
            .ok_or_else(|| DomainError::not_found("product", id))
    }

    pub(crate) fn product_mut(&mut self, id: ProductId) -> DomainResult<&mut Product> {
        self.products
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("product", id))
    }

    /// Apply a balance change; fails without mutating if a balance would go negative.
    pub(crate) fn apply_delta(&mut self, id: ProductId, delta: StockDelta) -> DomainResult<()> {
        self.product_mut(id)?.apply_delta(delta)
    }

    /// Fail with `InsufficientStock` unless on-hand covers `units`.
    pub(crate) fn ensure_on_hand(&self, id: ProductId, units: i64) -> DomainResult<()> {
        let product = self.product(id)?;
        if product.stock_on_hand() < units {
            return Err(DomainError::insufficient(
                id.0,
                StockPool::OnHand,
                units,
                product.stock_on_hand(),
            ));
        }
        Ok(())
    }

    /// Consignment holding the given line, with the line itself.
    pub fn find_consignment_line(
        &self,
        line_id: ConsignmentLineId,
    ) -> DomainResult<(&Consignment, &ConsignmentLine)> {
        self.consignments
            .values()
            .find_map(|c| c.line(line_id).map(|l| (c, l)))
            .ok_or_else(|| DomainError::not_found("consignment line", line_id))
    }

    /// Price changes of a product, newest first.
    pub fn price_history_of(&self, id: ProductId) -> Vec<PriceHistoryEntry> {
        self.price_history
            .iter()
            .rev()
            .filter(|e| e.product_id == id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use stockledger_core::BrandId;
    use stockledger_products::NewProduct;

    fn product(stock: i64) -> Product {
        let input = NewProduct {
            brand_id: BrandId::new(),
            name: "Tannat".into(),
            sale_price: dec!(9),
            initial_cost: dec!(4),
            initial_stock: stock,
            units_per_case: 12,
            min_stock: 0,
        };
        Product::register(ProductId::generate(), &input, Utc::now()).unwrap()
    }

    #[test]
    fn table_is_keyed_by_entity_id() {
        let mut table = Table::default();
        let p = product(0);
        let id = p.id_typed();
        assert!(table.insert(p).is_none());
        assert!(table.contains(&id));
        assert_eq!(table.len(), 1);
        assert!(table.remove(&id).is_some());
        assert!(table.is_empty());
    }

    #[test]
    fn ensure_on_hand_reports_available() {
        let mut state = StoreState::default();
        let p = product(5);
        let id = p.id_typed();
        state.products.insert(p);

        assert!(state.ensure_on_hand(id, 5).is_ok());
        let err = state.ensure_on_hand(id, 6).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InsufficientStock {
                requested: 6,
                available: 5,
                ..
            }
        ));
    }

    #[test]
    fn unknown_product_is_not_found() {
        let state = StoreState::default();
        assert!(matches!(
            state.product(ProductId::generate()),
            Err(DomainError::NotFound { entity: "product", .. })
        ));
    }
}
