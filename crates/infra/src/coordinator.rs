//! Write side of the ledger.
//!
//! Every operation is one unit of work: catalog balance changes, ledger
//! appends/removals and consignment transitions are committed together or not
//! at all. Validation runs inside the unit of work, so a retried conflict
//! re-validates against fresh state.
//!
//! ```text
//! operation
//!   ↓
//! 1. begin (private copy of committed state)
//!   ↓
//! 2. validate + mutate catalog / ledger / headers
//!   ↓
//! 3. commit (optimistic; retried on conflict)
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use stockledger_consignment::{Consignment, ConsignmentDraft, ConsignmentId, ConsignmentLineId, LineRelease};
use stockledger_core::{sum_by_key, DomainError, DomainResult};
use stockledger_inventory::{MovementKind, MovementSource, NewMovement};
use stockledger_products::{blend, NewProduct, Product, ProductId, StockDelta};
use stockledger_purchasing::{Purchase, PurchaseDraft, PurchaseId};
use stockledger_sales::{Sale, SaleDraft, SaleId, SaleLine};

use crate::config::LedgerConfig;
use crate::error::CommandError;
use crate::store::{atomically, Datastore, StoreState};

/// Outcome of settling consigned units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsignmentSettlement {
    pub sale: Sale,
    pub consignment: Consignment,
    pub release: LineRelease,
}

/// Outcome of returning consigned units to the warehouse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsignmentReturn {
    pub consignment: Consignment,
    pub release: LineRelease,
}

/// Runs every stock-changing operation as one unit of work.
///
/// ## Operations
///
/// | operation | on-hand | in consignment | movement |
/// |---|---|---|---|
/// | `register_product` | `+initial` | | `INITIAL_STOCK` |
/// | `record_sale` | `-units` | | `SALE` per line |
/// | `cancel_sale` | `+units` | | removes the sale's |
/// | `record_purchase` | `+units`, cost blended | | `PURCHASE` per line |
/// | `cancel_purchase` | `-units` | | removes the purchase's |
/// | `deliver_consignment` | `-q` | `+q` | `CONSIGNMENT_DELIVERY` per line |
/// | `settle_consignment_line` | | `-q` | `SALE_CONSIGNMENT` |
/// | `return_consignment_line` | `+q` | `-q` | `CONSIGNMENT_RETURN` |
///
/// ## Validation
///
/// Stock checks aggregate units per product across all lines of a draft
/// before anything is written. Unit and money totals use checked arithmetic;
/// an overflow is rejected as `InvalidQuantity` or `Validation`.
///
/// ## Failure
///
/// Any error drops the unit of work. Conflicting commits are retried up to
/// `max_conflict_retries` times with validation re-run against fresh state;
/// a storage failure at commit surfaces as `StorageFailure` and commits nothing.
#[derive(Debug, Clone)]
pub struct TransactionCoordinator<S> {
    store: S,
    config: LedgerConfig,
}

impl<S> TransactionCoordinator<S>
where
    S: Datastore,
{
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn run<T, F>(&self, operation: &'static str, work: F) -> Result<T, CommandError>
    where
        F: FnMut(&mut StoreState) -> Result<T, CommandError>,
    {
        atomically(&self.store, operation, self.config.max_conflict_retries, work)
    }

    /// Create a product; initial stock is costed and recorded as `INITIAL_STOCK`.
    pub fn register_product(&self, input: NewProduct) -> Result<Product, CommandError> {
        input.validate()?;
        let product = self.run("register_product", |state| {
            let now = Utc::now();
            let product = Product::register(ProductId::generate(), &input, now)?;
            let id = product.id_typed();
            state.products.insert(product.clone());

            if input.initial_stock > 0 {
                state.append_movement(NewMovement::new(
                    id,
                    MovementKind::InitialStock,
                    input.initial_stock,
                    MovementSource::ProductRegistration(id),
                    now,
                )?)?;
            }
            Ok(product)
        })?;

        info!(
            product_id = %product.id_typed(),
            name = product.name(),
            initial_stock = product.stock_on_hand(),
            avg_cost = %product.weighted_avg_cost(),
            "product registered"
        );
        Ok(product)
    }

    /// Record a direct sale. Units are checked per product against on-hand
    /// stock before anything is written.
    pub fn record_sale(&self, draft: SaleDraft) -> Result<Sale, CommandError> {
        draft.validate()?;
        let sale = self.run("record_sale", |state| {
            let lines = draft
                .lines
                .iter()
                .zip(1u32..)
                .map(|(line, line_no)| -> DomainResult<SaleLine> {
                    line.resolve(line_no, state.product(line.product_id)?)
                })
                .collect::<DomainResult<Vec<_>>>()?;

            for (product_id, units) in sum_by_key(lines.iter().map(|l| (l.product_id, l.units)))? {
                state.ensure_on_hand(product_id, units)?;
            }

            let sale = Sale::record(
                SaleId::generate(),
                draft.client_id,
                draft.invoice_ref.clone(),
                draft.note.clone(),
                lines,
                draft.occurred_at,
            )?;
            let source = MovementSource::Sale(sale.id_typed());
            for line in sale.lines() {
                state.apply_delta(line.product_id, StockDelta::on_hand(-line.units))?;
                state.append_movement(NewMovement::new(
                    line.product_id,
                    MovementKind::Sale,
                    line.units,
                    source,
                    sale.occurred_at(),
                )?)?;
            }
            state.sales.insert(sale.clone());
            Ok(sale)
        })?;

        info!(
            sale_id = %sale.id_typed(),
            client_id = %sale.client_id(),
            lines = sale.lines().len(),
            total = %sale.total(),
            "sale recorded"
        );
        Ok(sale)
    }

    /// Undo a direct sale: restore on-hand stock and drop its movements.
    pub fn cancel_sale(&self, sale_id: SaleId) -> Result<Sale, CommandError> {
        let sale = self.run("cancel_sale", |state| {
            let sale = state
                .sales
                .get(&sale_id)
                .ok_or_else(|| DomainError::not_found("sale", sale_id))?
                .clone();
            if sale.is_consignment_settlement() {
                return Err(CommandError::Validation(format!(
                    "sale {sale_id} settles a consignment and cannot be cancelled"
                )));
            }

            for line in sale.lines() {
                state.apply_delta(line.product_id, StockDelta::on_hand(line.units))?;
            }
            state.remove_movements_for(MovementSource::Sale(sale_id));
            state.sales.remove(&sale_id);
            Ok(sale)
        })?;

        info!(sale_id = %sale_id, units = sale.total_units(), "sale cancelled");
        Ok(sale)
    }

    /// Record a supplier purchase, blending each line into the average cost.
    pub fn record_purchase(&self, draft: PurchaseDraft) -> Result<Purchase, CommandError> {
        draft.validate()?;
        let purchase = self.run("record_purchase", |state| {
            for line in &draft.lines {
                state.product(line.product_id)?;
            }
            let purchase = Purchase::record(
                PurchaseId::generate(),
                draft.supplier_id,
                draft.invoice_ref.clone(),
                draft.freight,
                draft.to_lines(),
                draft.occurred_at,
            )?;

            let source = MovementSource::Purchase(purchase.id_typed());
            for line in purchase.lines() {
                let product = state.product(line.product_id)?;
                let avg_cost = blend(
                    product.stock_on_hand(),
                    product.weighted_avg_cost(),
                    line.quantity_units,
                    line.net_unit_cost,
                )?;
                state.apply_delta(
                    line.product_id,
                    StockDelta::on_hand(line.quantity_units).with_avg_cost(avg_cost),
                )?;
                state.append_movement(NewMovement::new(
                    line.product_id,
                    MovementKind::Purchase,
                    line.quantity_units,
                    source,
                    purchase.occurred_at(),
                )?)?;
            }
            state.purchases.insert(purchase.clone());
            Ok(purchase)
        })?;

        info!(
            purchase_id = %purchase.id_typed(),
            supplier_id = %purchase.supplier_id(),
            lines = purchase.lines().len(),
            total = %purchase.total(),
            "purchase recorded"
        );
        Ok(purchase)
    }

    /// Undo a purchase. The average cost keeps the blended value.
    pub fn cancel_purchase(&self, purchase_id: PurchaseId) -> Result<Purchase, CommandError> {
        let purchase = self.run("cancel_purchase", |state| {
            let purchase = state
                .purchases
                .get(&purchase_id)
                .ok_or_else(|| DomainError::not_found("purchase", purchase_id))?
                .clone();

            let per_product = purchase.units_by_product()?;
            for (product_id, units) in &per_product {
                state.ensure_on_hand(*product_id, *units)?;
            }
            for (product_id, units) in per_product {
                state.apply_delta(product_id, StockDelta::on_hand(-units))?;
            }
            state.remove_movements_for(MovementSource::Purchase(purchase_id));
            state.purchases.remove(&purchase_id);
            Ok(purchase)
        })?;

        info!(purchase_id = %purchase_id, "purchase cancelled");
        Ok(purchase)
    }

    /// Move stock from the warehouse to a consignee under a new ACTIVE consignment.
    pub fn deliver_consignment(&self, draft: ConsignmentDraft) -> Result<Consignment, CommandError> {
        draft.validate()?;
        let consignment = self.run("deliver_consignment", |state| {
            for (product_id, units) in draft.units_by_product()? {
                state.ensure_on_hand(product_id, units)?;
            }

            let consignment = Consignment::open(ConsignmentId::generate(), &draft)?;
            let source = MovementSource::Consignment(consignment.id_typed());
            for line in consignment.lines() {
                state.apply_delta(line.product_id, StockDelta::deliver(line.delivered))?;
                state.append_movement(NewMovement::new(
                    line.product_id,
                    MovementKind::ConsignmentDelivery,
                    line.delivered,
                    source,
                    consignment.created_at(),
                )?)?;
            }
            state.consignments.insert(consignment.clone());
            Ok(consignment)
        })?;

        info!(
            consignment_id = %consignment.id_typed(),
            client_id = %consignment.client_id(),
            units = consignment.outstanding_units(),
            "consignment delivered"
        );
        Ok(consignment)
    }

    /// The consignee paid for `quantity` units of a line: record the
    /// settlement sale and release the units from consignment stock.
    pub fn settle_consignment_line(
        &self,
        line_id: ConsignmentLineId,
        quantity: i64,
        unit_price: Decimal,
    ) -> Result<ConsignmentSettlement, CommandError> {
        if unit_price.is_sign_negative() {
            return Err(CommandError::Validation(
                "settlement price must be non-negative".to_string(),
            ));
        }
        let settlement = self.run("settle_consignment_line", |state| {
            let now = Utc::now();
            let (consignment, release) = take_from_line(state, line_id, quantity, now)?;

            let sale = Sale::settlement(
                SaleId::generate(),
                consignment.client_id(),
                release.product_id,
                quantity,
                unit_price,
                now,
            )?;
            state.apply_delta(release.product_id, StockDelta::settle(quantity))?;
            state.append_movement(NewMovement::new(
                release.product_id,
                MovementKind::SaleConsignment,
                quantity,
                MovementSource::Sale(sale.id_typed()),
                now,
            )?)?;
            state.sales.insert(sale.clone());

            Ok(ConsignmentSettlement {
                sale,
                consignment,
                release,
            })
        })?;

        info!(
            consignment_id = %settlement.consignment.id_typed(),
            line_id = %line_id,
            sale_id = %settlement.sale.id_typed(),
            quantity,
            closed = settlement.release.closed,
            "consignment line settled"
        );
        Ok(settlement)
    }

    /// `quantity` units of a line come back to the warehouse.
    pub fn return_consignment_line(
        &self,
        line_id: ConsignmentLineId,
        quantity: i64,
    ) -> Result<ConsignmentReturn, CommandError> {
        let returned = self.run("return_consignment_line", |state| {
            let now = Utc::now();
            let (consignment, release) = take_from_line(state, line_id, quantity, now)?;

            state.apply_delta(release.product_id, StockDelta::give_back(quantity))?;
            state.append_movement(NewMovement::new(
                release.product_id,
                MovementKind::ConsignmentReturn,
                quantity,
                MovementSource::Consignment(consignment.id_typed()),
                now,
            )?)?;

            Ok(ConsignmentReturn {
                consignment,
                release,
            })
        })?;

        info!(
            consignment_id = %returned.consignment.id_typed(),
            line_id = %line_id,
            quantity,
            closed = returned.release.closed,
            "consignment line returned"
        );
        Ok(returned)
    }
}

/// Decrement a consignment line inside the unit of work; returns the updated header.
fn take_from_line(
    state: &mut StoreState,
    line_id: ConsignmentLineId,
    quantity: i64,
    at: DateTime<Utc>,
) -> Result<(Consignment, LineRelease), CommandError> {
    let consignment_id = state.find_consignment_line(line_id)?.0.id_typed();
    let consignment = state
        .consignments
        .get_mut(&consignment_id)
        .ok_or_else(|| DomainError::not_found("consignment", consignment_id))?;
    let release = consignment.take(line_id, quantity, at)?;
    Ok((consignment.clone(), release))
}
