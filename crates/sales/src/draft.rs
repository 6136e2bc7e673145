use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{ClientId, DomainError, DomainResult};
use stockledger_products::{Product, ProductId, SaleFormat};

use crate::sale::SaleLine;

/// One cart row before the sale is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSaleLine {
    pub product_id: ProductId,
    pub format: SaleFormat,
    pub quantity_in_format: i64,
    /// Negotiated unit price; `None` takes the catalog price at commit time.
    pub unit_price: Option<Decimal>,
}

impl DraftSaleLine {
    /// Resolve against the product as it is inside the unit of work.
    pub fn resolve(&self, line_no: u32, product: &Product) -> DomainResult<SaleLine> {
        let units = product.units_for(self.format, self.quantity_in_format)?;
        let unit_price = self.unit_price.unwrap_or_else(|| product.sale_price());
        Ok(SaleLine {
            line_no,
            product_id: self.product_id,
            format: self.format,
            quantity_in_format: self.quantity_in_format,
            units,
            unit_price,
            is_consignment_settlement: false,
        })
    }
}

/// Sale cart. Pure data until handed to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDraft {
    pub client_id: ClientId,
    pub invoice_ref: String,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub lines: Vec<DraftSaleLine>,
}

impl SaleDraft {
    pub fn new(client_id: ClientId, invoice_ref: impl Into<String>) -> Self {
        Self {
            client_id,
            invoice_ref: invoice_ref.into(),
            note: None,
            occurred_at: Utc::now(),
            lines: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    /// Add a line sold at the catalog price.
    pub fn line(self, product_id: ProductId, format: SaleFormat, quantity_in_format: i64) -> Self {
        self.push(DraftSaleLine {
            product_id,
            format,
            quantity_in_format,
            unit_price: None,
        })
    }

    /// Add a line at an explicit unit price.
    pub fn priced_line(
        self,
        product_id: ProductId,
        format: SaleFormat,
        quantity_in_format: i64,
        unit_price: Decimal,
    ) -> Self {
        self.push(DraftSaleLine {
            product_id,
            format,
            quantity_in_format,
            unit_price: Some(unit_price),
        })
    }

    fn push(mut self, line: DraftSaleLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Drop the cart row at `index`, if present.
    pub fn remove_line(&mut self, index: usize) -> Option<DraftSaleLine> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Shape checks that need no catalog access.
    pub fn validate(&self) -> DomainResult<()> {
        if self.lines.is_empty() {
            return Err(DomainError::validation("sale draft has no lines"));
        }
        for (i, line) in self.lines.iter().enumerate() {
            if line.quantity_in_format <= 0 {
                return Err(DomainError::invalid_quantity(format!(
                    "line {} quantity must be positive (got {})",
                    i + 1,
                    line.quantity_in_format
                )));
            }
            if line.unit_price.is_some_and(|p| p.is_sign_negative()) {
                return Err(DomainError::validation(format!(
                    "line {} has a negative unit price",
                    i + 1
                )));
            }
        }
        Ok(())
    }
}
