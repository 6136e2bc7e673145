//! Sales domain module.
//!
//! Sale headers and lines (with historical prices) plus the `SaleDraft` cart
//! builder, implemented purely as deterministic domain logic.

pub mod draft;
pub mod sale;

pub use draft::{DraftSaleLine, SaleDraft};
pub use sale::{Sale, SaleId, SaleLine, SETTLEMENT_INVOICE_REF};
