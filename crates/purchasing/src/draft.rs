use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, SupplierId};
use stockledger_products::ProductId;

use crate::purchase::PurchaseLine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPurchaseLine {
    pub product_id: ProductId,
    pub quantity_units: i64,
    pub net_unit_cost: Decimal,
}

/// Purchase cart. Pure data until handed to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseDraft {
    pub supplier_id: SupplierId,
    pub invoice_ref: String,
    pub freight: Decimal,
    pub occurred_at: DateTime<Utc>,
    pub lines: Vec<DraftPurchaseLine>,
}

impl PurchaseDraft {
    pub fn new(supplier_id: SupplierId, invoice_ref: impl Into<String>) -> Self {
        Self {
            supplier_id,
            invoice_ref: invoice_ref.into(),
            freight: Decimal::ZERO,
            occurred_at: Utc::now(),
            lines: Vec::new(),
        }
    }

    pub fn with_freight(mut self, freight: Decimal) -> Self {
        self.freight = freight;
        self
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    pub fn line(mut self, product_id: ProductId, quantity_units: i64, net_unit_cost: Decimal) -> Self {
        self.lines.push(DraftPurchaseLine {
            product_id,
            quantity_units,
            net_unit_cost,
        });
        self
    }

    pub fn remove_line(&mut self, index: usize) -> Option<DraftPurchaseLine> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.lines.is_empty() {
            return Err(DomainError::validation("purchase draft has no lines"));
        }
        if self.freight.is_sign_negative() {
            return Err(DomainError::validation("freight must be non-negative"));
        }
        for (i, line) in self.lines.iter().enumerate() {
            if line.quantity_units <= 0 {
                return Err(DomainError::invalid_quantity(format!(
                    "line {} quantity must be positive (got {})",
                    i + 1,
                    line.quantity_units
                )));
            }
            if line.net_unit_cost.is_sign_negative() {
                return Err(DomainError::validation(format!(
                    "line {} has a negative unit cost",
                    i + 1
                )));
            }
        }
        Ok(())
    }

    /// Numbered purchase lines, in cart order.
    pub fn to_lines(&self) -> Vec<PurchaseLine> {
        self.lines
            .iter()
            .zip(1u32..)
            .map(|(l, line_no)| PurchaseLine {
                line_no,
                product_id: l.product_id,
                quantity_units: l.quantity_units,
                net_unit_cost: l.net_unit_cost,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn lines_are_numbered_from_one() {
        let draft = PurchaseDraft::new(SupplierId::new(), "OC-1")
            .line(ProductId::generate(), 10, dec!(2))
            .line(ProductId::generate(), 5, dec!(3));
        let lines = draft.to_lines();
        assert_eq!(lines[0].line_no, 1);
        assert_eq!(lines[1].line_no, 2);
    }

    #[test]
    fn validate_rejects_bad_rows() {
        let empty = PurchaseDraft::new(SupplierId::new(), "OC-2");
        assert!(matches!(empty.validate(), Err(DomainError::Validation(_))));

        let negative = PurchaseDraft::new(SupplierId::new(), "OC-3").line(ProductId::generate(), -2, dec!(1));
        assert!(matches!(negative.validate(), Err(DomainError::InvalidQuantity(_))));

        let cost = PurchaseDraft::new(SupplierId::new(), "OC-4").line(ProductId::generate(), 2, dec!(-1));
        assert!(matches!(cost.validate(), Err(DomainError::Validation(_))));
    }
}
