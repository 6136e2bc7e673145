//! Walkthrough of the ledger against the in-memory datastore: purchase,
//! consignment delivery and settlement, then reconciliation, KPIs, stock status
//! and purchase history printed as JSON.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;

use stockledger_consignment::ConsignmentDraft;
use stockledger_core::{BrandId, ClientId, SupplierId};
use stockledger_infra::{
    HistoryReader, InMemoryDatastore, LedgerConfig, ReconciliationChecker, Reports,
    TransactionCoordinator,
};
use stockledger_products::NewProduct;
use stockledger_purchasing::PurchaseDraft;

fn main() -> anyhow::Result<()> {
    stockledger_observability::init();

    let config = LedgerConfig::from_env().context("invalid STOCKLEDGER_* configuration")?;
    tracing::info!(?config, "starting walkthrough");

    let store = Arc::new(InMemoryDatastore::new());
    let coordinator = TransactionCoordinator::new(store.clone(), config);

    let product = coordinator
        .register_product(NewProduct {
            brand_id: BrandId::new(),
            name: "Malbec Reserva 750ml".to_string(),
            sale_price: Decimal::new(1800, 2),
            initial_cost: Decimal::ZERO,
            initial_stock: 0,
            units_per_case: 6,
            min_stock: 12,
        })
        .context("registering product")?;
    let product_id = product.id_typed();

    coordinator
        .record_purchase(
            PurchaseDraft::new(SupplierId::new(), "OC-0001").line(product_id, 100, Decimal::new(10, 0)),
        )
        .context("recording purchase")?;

    let consignment = coordinator
        .deliver_consignment(ConsignmentDraft::new(ClientId::new()).line(product_id, 30))
        .context("delivering consignment")?;
    let line_id = consignment
        .lines()
        .first()
        .map(|l| l.id)
        .context("delivered consignment has no lines")?;

    let settlement = coordinator
        .settle_consignment_line(line_id, 20, Decimal::new(15, 0))
        .context("settling consignment line")?;
    tracing::info!(sale_id = %settlement.sale.id_typed(), "settlement sale created");

    let reconciliation = ReconciliationChecker::new(store.clone())
        .check_all()
        .context("reconciling ledger")?;
    let purchases = HistoryReader::new(store.clone())
        .purchase_lines(Some(product_id))
        .context("reading purchase history")?;
    let reports = Reports::new(store, config);
    let now = Utc::now();
    let kpis = reports.kpis(now).context("computing KPIs")?;
    let stock = reports.stock_status(now).context("computing stock status")?;

    let output = serde_json::json!({
        "reconciliation": reconciliation,
        "kpis": kpis,
        "stock": stock,
        "purchases": purchases,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
