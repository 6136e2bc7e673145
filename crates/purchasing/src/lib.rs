//! Purchasing domain module.
//!
//! Supplier purchase headers and lines, freight allocation (landed cost) and
//! the `PurchaseDraft` builder.

pub mod draft;
pub mod purchase;

pub use draft::{DraftPurchaseLine, PurchaseDraft};
pub use purchase::{Purchase, PurchaseId, PurchaseLine};
