use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::product::ProductId;

/// One sale-price change. Append-only; written once per change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub product_id: ProductId,
    pub previous_price: Decimal,
    pub new_price: Decimal,
    pub changed_at: DateTime<Utc>,
}
