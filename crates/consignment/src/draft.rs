use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{sum_by_key, ClientId, DomainError, DomainResult};
use stockledger_products::ProductId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftConsignmentLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Consignment delivery cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsignmentDraft {
    pub client_id: ClientId,
    pub occurred_at: DateTime<Utc>,
    pub lines: Vec<DraftConsignmentLine>,
}

impl ConsignmentDraft {
    pub fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            occurred_at: Utc::now(),
            lines: Vec::new(),
        }
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    pub fn line(mut self, product_id: ProductId, quantity: i64) -> Self {
        self.lines.push(DraftConsignmentLine {
            product_id,
            quantity,
        });
        self
    }

    pub fn remove_line(&mut self, index: usize) -> Option<DraftConsignmentLine> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.lines.is_empty() {
            return Err(DomainError::validation("consignment draft has no lines"));
        }
        if let Some(line) = self.lines.iter().find(|l| l.quantity <= 0) {
            return Err(DomainError::invalid_quantity(format!(
                "delivery quantity must be positive (got {})",
                line.quantity
            )));
        }
        Ok(())
    }

    /// Units per product, in order of first appearance.
    pub fn units_by_product(&self) -> DomainResult<Vec<(ProductId, i64)>> {
        sum_by_key(self.lines.iter().map(|l| (l.product_id, l.quantity)))
    }
}
