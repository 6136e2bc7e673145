//! Products domain module.
//!
//! This crate contains the catalog rules for products: stock balances, the
//! weighted-average cost blend and sale-price changes, implemented purely as
//! deterministic domain logic (no IO, no storage).

pub mod cost;
pub mod money;
pub mod price;
pub mod product;

pub use cost::blend;
pub use price::PriceHistoryEntry;
pub use product::{NewProduct, Product, ProductId, SaleFormat, StockDelta};
