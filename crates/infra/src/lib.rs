//! Infrastructure layer: datastore, ledger, coordinator, reconciliation and
//! read-side reports.

pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod history;
pub mod ledger;
pub mod reconciliation;
pub mod reports;
pub mod store;


pub use catalog::ProductCatalog;
pub use config::LedgerConfig;
pub use coordinator::{ConsignmentReturn, ConsignmentSettlement, TransactionCoordinator};
pub use error::CommandError;
pub use history::{HistoryReader, OutstandingLine, PurchaseLineRow};
pub use ledger::{MovementLedger, MovementQuery};
pub use reconciliation::{DriftReport, ReconciliationChecker};
pub use reports::{
    AgingRow, ConsignmentExposure, CostVariationRow, DashboardKpis, LowStockRow, MovementTotal,
    Reports, StockStatus, StockStatusRow, COST_VARIATION_THRESHOLD_PCT,
};
pub use store::{Datastore, InMemoryDatastore, StoreError, StoreState, Transaction};
