use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{aggregate_id, sum_by_key, DomainError, DomainResult, Entity, SupplierId};
use stockledger_products::{money, ProductId};

aggregate_id! {
    /// Purchase identifier.
    pub struct PurchaseId;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity_units: i64,
    /// Unit cost before freight.
    pub net_unit_cost: Decimal,
}

impl PurchaseLine {
    pub fn subtotal(&self) -> DomainResult<Decimal> {
        money::line_amount(self.quantity_units, self.net_unit_cost)
    }
}

/// Supplier purchase. `total` includes freight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    id: PurchaseId,
    supplier_id: SupplierId,
    invoice_ref: String,
    freight: Decimal,
    total: Decimal,
    lines: Vec<PurchaseLine>,
    occurred_at: DateTime<Utc>,
}

impl Purchase {
    pub fn record(
        id: PurchaseId,
        supplier_id: SupplierId,
        invoice_ref: impl Into<String>,
        freight: Decimal,
        lines: Vec<PurchaseLine>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("a purchase needs at least one line"));
        }
        if freight.is_sign_negative() {
            return Err(DomainError::validation("freight must be non-negative"));
        }
        for line in &lines {
            if line.quantity_units <= 0 {
                return Err(DomainError::invalid_quantity(format!(
                    "line {} has non-positive quantity",
                    line.line_no
                )));
            }
            if line.net_unit_cost.is_sign_negative() {
                return Err(DomainError::validation(format!(
                    "line {} has a negative unit cost",
                    line.line_no
                )));
            }
        }

        sum_by_key(lines.iter().map(|l| (l.product_id, l.quantity_units)))?;
        let merchandise = money::sum_amounts(lines.iter().map(PurchaseLine::subtotal))?;
        Ok(Self {
            id,
            supplier_id,
            invoice_ref: invoice_ref.into(),
            freight,
            total: money::add(merchandise, freight)?,
            lines,
            occurred_at,
        })
    }

    pub fn id_typed(&self) -> PurchaseId {
        self.id
    }

    pub fn supplier_id(&self) -> SupplierId {
        self.supplier_id
    }

    pub fn invoice_ref(&self) -> &str {
        &self.invoice_ref
    }

    pub fn freight(&self) -> Decimal {
        self.freight
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn lines(&self) -> &[PurchaseLine] {
        &self.lines
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Σ line subtotals, freight excluded.
    pub fn merchandise_total(&self) -> Decimal {
        self.total - self.freight
    }

    /// Net unit cost with freight spread proportionally over merchandise value.
    pub fn landed_unit_cost(&self, line: &PurchaseLine) -> DomainResult<Decimal> {
        let merchandise = self.merchandise_total();
        if merchandise.is_zero() {
            return Ok(line.net_unit_cost);
        }
        let out_of_range = || DomainError::validation("landed cost exceeds the supported decimal range");
        let share = self.freight.checked_div(merchandise).ok_or_else(out_of_range)?;
        let factor = Decimal::ONE.checked_add(share).ok_or_else(out_of_range)?;
        line.net_unit_cost
            .checked_mul(factor)
            .map(|cost| cost.normalize())
            .ok_or_else(out_of_range)
    }

    /// Units per product, in line order of first appearance.
    pub fn units_by_product(&self) -> DomainResult<Vec<(ProductId, i64)>> {
        sum_by_key(self.lines.iter().map(|l| (l.product_id, l.quantity_units)))
    }
}

impl Entity for Purchase {
    type Id = PurchaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
