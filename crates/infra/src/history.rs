//! Read-only history queries over committed state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stockledger_consignment::{Consignment, ConsignmentId, ConsignmentLine};
use stockledger_core::{ClientId, DomainError, SupplierId};
use stockledger_products::{PriceHistoryEntry, ProductId};
use stockledger_purchasing::{Purchase, PurchaseId};
use stockledger_sales::{Sale, SaleId};

use crate::error::CommandError;
use crate::store::Datastore;

/// A consignment line still at a client location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutstandingLine {
    pub consignment_id: ConsignmentId,
    pub delivered_at: DateTime<Utc>,
    pub line: ConsignmentLine,
}

/// One purchased product as shown in purchase history, with its landed cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseLineRow {
    pub purchase_id: PurchaseId,
    pub supplier_id: SupplierId,
    pub invoice_ref: String,
    pub occurred_at: DateTime<Utc>,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity_units: i64,
    pub net_unit_cost: Decimal,
    /// Net unit cost plus its share of the purchase freight.
    pub landed_unit_cost: Decimal,
}

/// Side-effect free reads of sales, purchases, consignments and price changes.
///
/// ## Ordering
///
/// Document lists are newest first, ties broken by id so that repeated reads
/// of the same snapshot return the same order. Outstanding consignment lines
/// are oldest delivery first, the order a collector works through them.
///
/// ## Retention
///
/// Closed consignments stay readable with status `CLOSED`. Cancelled sales and
/// purchases are gone.
#[derive(Debug, Clone)]
pub struct HistoryReader<S> {
    store: S,
}

impl<S> HistoryReader<S>
where
    S: Datastore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Sales newest first, optionally for one client.
    pub fn sales(&self, client_id: Option<ClientId>) -> Result<Vec<Sale>, CommandError> {
        let snapshot = self.store.snapshot()?;
        let mut sales: Vec<Sale> = snapshot
            .sales()
            .values()
            .filter(|s| client_id.is_none_or(|c| s.client_id() == c))
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.occurred_at().cmp(&a.occurred_at()).then(b.id_typed().cmp(&a.id_typed())));
        Ok(sales)
    }

    pub fn sale(&self, id: SaleId) -> Result<Sale, CommandError> {
        let snapshot = self.store.snapshot()?;
        snapshot
            .sales()
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("sale", id).into())
    }

    pub fn purchases(&self) -> Result<Vec<Purchase>, CommandError> {
        let snapshot = self.store.snapshot()?;
        let mut purchases: Vec<Purchase> = snapshot.purchases().values().cloned().collect();
        purchases.sort_by(|a, b| b.occurred_at().cmp(&a.occurred_at()).then(b.id_typed().cmp(&a.id_typed())));
        Ok(purchases)
    }

    /// Purchase lines newest first with landed cost, optionally for one product.
    pub fn purchase_lines(&self, product_id: Option<ProductId>) -> Result<Vec<PurchaseLineRow>, CommandError> {
        let snapshot = self.store.snapshot()?;
        let mut rows = Vec::new();
        for purchase in snapshot.purchases().values() {
            for line in purchase
                .lines()
                .iter()
                .filter(|l| product_id.is_none_or(|p| l.product_id == p))
            {
                rows.push(PurchaseLineRow {
                    purchase_id: purchase.id_typed(),
                    supplier_id: purchase.supplier_id(),
                    invoice_ref: purchase.invoice_ref().to_string(),
                    occurred_at: purchase.occurred_at(),
                    product_id: line.product_id,
                    product_name: snapshot.product(line.product_id)?.name().to_string(),
                    quantity_units: line.quantity_units,
                    net_unit_cost: line.net_unit_cost,
                    landed_unit_cost: purchase.landed_unit_cost(line)?,
                });
            }
        }
        rows.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then(b.purchase_id.cmp(&a.purchase_id))
        });
        Ok(rows)
    }

    pub fn purchase(&self, id: PurchaseId) -> Result<Purchase, CommandError> {
        let snapshot = self.store.snapshot()?;
        snapshot
            .purchases()
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("purchase", id).into())
    }

    /// Consignments newest first; closed ones are included unless `active_only`.
    pub fn consignments(&self, active_only: bool) -> Result<Vec<Consignment>, CommandError> {
        let snapshot = self.store.snapshot()?;
        let mut consignments: Vec<Consignment> = snapshot
            .consignments()
            .values()
            .filter(|c| !active_only || c.is_active())
            .cloned()
            .collect();
        consignments.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then(b.id_typed().cmp(&a.id_typed())));
        Ok(consignments)
    }

    pub fn consignment(&self, id: ConsignmentId) -> Result<Consignment, CommandError> {
        let snapshot = self.store.snapshot()?;
        snapshot
            .consignments()
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("consignment", id).into())
    }

    /// Lines a client still holds, oldest delivery first.
    pub fn outstanding_lines(&self, client_id: ClientId) -> Result<Vec<OutstandingLine>, CommandError> {
        let snapshot = self.store.snapshot()?;
        let mut lines: Vec<OutstandingLine> = snapshot
            .consignments()
            .values()
            .filter(|c| c.is_active() && c.client_id() == client_id)
            .flat_map(|c| {
                c.lines().iter().map(move |line| OutstandingLine {
                    consignment_id: c.id_typed(),
                    delivered_at: c.created_at(),
                    line: line.clone(),
                })
            })
            .collect();
        lines.sort_by(|a, b| {
            a.delivered_at
                .cmp(&b.delivered_at)
                .then(a.consignment_id.cmp(&b.consignment_id))
        });
        Ok(lines)
    }

    pub fn price_history(&self, product_id: ProductId) -> Result<Vec<PriceHistoryEntry>, CommandError> {
        let snapshot = self.store.snapshot()?;
        snapshot.product(product_id)?;
        Ok(snapshot.price_history_of(product_id))
    }
}
