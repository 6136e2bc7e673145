//! Ledger replay against live balances.
//!
//! Expected on-hand stock is recomputed from the movement ledger and compared
//! with the catalog balance. Drift is reported and logged, never corrected.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use stockledger_inventory::LedgerBreakdown;
use stockledger_products::{Product, ProductId};

use crate::error::CommandError;
use crate::store::{Datastore, StoreState};

/// Expected vs. actual balances for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub product_id: ProductId,
    pub product_name: String,
    pub expected: i64,
    pub actual: i64,
    /// `actual - expected`.
    pub drift: i64,
    pub expected_in_consignment: i64,
    pub actual_in_consignment: i64,
    pub consignment_drift: i64,
    pub breakdown: LedgerBreakdown,
}

impl DriftReport {
    fn new(product: &Product, breakdown: LedgerBreakdown) -> Self {
        let expected = breakdown.expected_on_hand();
        let expected_in_consignment = breakdown.expected_in_consignment();
        Self {
            product_id: product.id_typed(),
            product_name: product.name().to_string(),
            expected,
            actual: product.stock_on_hand(),
            drift: product.stock_on_hand() - expected,
            expected_in_consignment,
            actual_in_consignment: product.stock_in_consignment(),
            consignment_drift: product.stock_in_consignment() - expected_in_consignment,
            breakdown,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.drift == 0 && self.consignment_drift == 0
    }
}

#[derive(Debug, Clone)]
pub struct ReconciliationChecker<S> {
    store: S,
}

impl<S> ReconciliationChecker<S>
where
    S: Datastore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// On-hand stock implied by the ledger for one product.
    pub fn compute_expected_stock(&self, product_id: ProductId) -> Result<i64, CommandError> {
        Ok(self.check(product_id)?.expected)
    }

    pub fn check(&self, product_id: ProductId) -> Result<DriftReport, CommandError> {
        let snapshot = self.store.snapshot()?;
        let product = snapshot.product(product_id)?;
        let breakdown = LedgerBreakdown::from_movements(
            snapshot
                .movements()
                .iter()
                .filter(|m| m.product_id == product_id),
        );
        let report = DriftReport::new(product, breakdown);
        log_drift(&report);
        Ok(report)
    }

    /// Every product with at least one movement, by name.
    pub fn check_all(&self) -> Result<Vec<DriftReport>, CommandError> {
        let snapshot = self.store.snapshot()?;
        let reports = check_state(&snapshot)?;

        let drifting = reports.iter().filter(|r| !r.is_consistent()).count();
        debug!(
            revision = snapshot.revision(),
            products = reports.len(),
            drifting,
            "reconciliation finished"
        );
        for report in &reports {
            log_drift(report);
        }
        Ok(reports)
    }
}

/// Single pass over the ledger, grouped per product.
pub(crate) fn check_state(state: &StoreState) -> Result<Vec<DriftReport>, CommandError> {
    let mut per_product: HashMap<ProductId, LedgerBreakdown> = HashMap::new();
    for movement in state.movements() {
        per_product
            .entry(movement.product_id)
            .or_default()
            .record(movement);
    }

    let mut reports = per_product
        .into_iter()
        .map(|(id, breakdown)| -> Result<DriftReport, CommandError> {
            Ok(DriftReport::new(state.product(id)?, breakdown))
        })
        .collect::<Result<Vec<_>, _>>()?;
    reports.sort_by(|a, b| {
        a.product_name
            .cmp(&b.product_name)
            .then(a.product_id.cmp(&b.product_id))
    });
    Ok(reports)
}

fn log_drift(report: &DriftReport) {
    if report.is_consistent() {
        return;
    }
    warn!(
        product_id = %report.product_id,
        expected = report.expected,
        actual = report.actual,
        drift = report.drift,
        consignment_drift = report.consignment_drift,
        "stock drift detected"
    );
}
