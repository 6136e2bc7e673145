use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{aggregate_id, checked_total, ClientId, DomainError, DomainResult, Entity};
use stockledger_products::{money, ProductId, SaleFormat};

aggregate_id! {
    /// Sale identifier.
    pub struct SaleId;
}

/// Invoice reference written on sales generated by consignment settlement.
pub const SETTLEMENT_INVOICE_REF: &str = "CONSIGNMENT";

/// Sale line. `unit_price` is the price at sale time and never follows later
/// catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub format: SaleFormat,
    pub quantity_in_format: i64,
    /// Units taken from stock (`quantity_in_format` resolved through the format).
    pub units: i64,
    pub unit_price: Decimal,
    pub is_consignment_settlement: bool,
}

impl SaleLine {
    pub fn subtotal(&self) -> DomainResult<Decimal> {
        money::line_amount(self.units, self.unit_price)
    }
}

/// Sale header owning its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    id: SaleId,
    client_id: ClientId,
    invoice_ref: String,
    note: Option<String>,
    total: Decimal,
    lines: Vec<SaleLine>,
    occurred_at: DateTime<Utc>,
}

impl Sale {
    /// Build a sale from already-resolved lines; the total is derived here.
    pub fn record(
        id: SaleId,
        client_id: ClientId,
        invoice_ref: impl Into<String>,
        note: Option<String>,
        lines: Vec<SaleLine>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("a sale needs at least one line"));
        }
        for line in &lines {
            if line.units <= 0 {
                return Err(DomainError::invalid_quantity(format!(
                    "line {} has non-positive units",
                    line.line_no
                )));
            }
            if line.unit_price.is_sign_negative() {
                return Err(DomainError::validation(format!(
                    "line {} has a negative unit price",
                    line.line_no
                )));
            }
        }

        checked_total(lines.iter().map(|l| l.units))?;
        let total = money::sum_amounts(lines.iter().map(SaleLine::subtotal))?;
        Ok(Self {
            id,
            client_id,
            invoice_ref: invoice_ref.into(),
            note,
            total,
            lines,
            occurred_at,
        })
    }

    /// Sale produced when a consignee pays for consigned goods: one unit line
    /// at the negotiated price.
    pub fn settlement(
        id: SaleId,
        client_id: ClientId,
        product_id: ProductId,
        units: i64,
        unit_price: Decimal,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let line = SaleLine {
            line_no: 1,
            product_id,
            format: SaleFormat::Unit,
            quantity_in_format: units,
            units,
            unit_price,
            is_consignment_settlement: true,
        };
        Self::record(id, client_id, SETTLEMENT_INVOICE_REF, None, vec![line], occurred_at)
    }

    pub fn id_typed(&self) -> SaleId {
        self.id
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn invoice_ref(&self) -> &str {
        &self.invoice_ref
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn lines(&self) -> &[SaleLine] {
        &self.lines
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn is_consignment_settlement(&self) -> bool {
        self.lines.iter().any(|l| l.is_consignment_settlement)
    }

    /// Cannot overflow: `record` rejects sales whose unit total does.
    pub fn total_units(&self) -> i64 {
        self.lines.iter().map(|l| l.units).sum()
    }
}

impl Entity for Sale {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(line_no: u32, units: i64, price: Decimal) -> SaleLine {
        SaleLine {
            line_no,
            product_id: ProductId::generate(),
            format: SaleFormat::Unit,
            quantity_in_format: units,
            units,
            unit_price: price,
            is_consignment_settlement: false,
        }
    }

    #[test]
    fn total_is_sum_of_line_subtotals() {
        let sale = Sale::record(
            SaleId::generate(),
            ClientId::new(),
            "A-0001",
            None,
            vec![line(1, 3, dec!(10)), line(2, 2, dec!(2.25))],
            Utc::now(),
        )
        .unwrap();
        assert_eq!(sale.total(), dec!(34.50));
        assert_eq!(sale.total_units(), 5);
        assert!(!sale.is_consignment_settlement());
    }

    #[test]
    fn empty_sale_is_rejected() {
        let err = Sale::record(SaleId::generate(), ClientId::new(), "", None, vec![], Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn out_of_range_amount_is_rejected() {
        let err = Sale::record(
            SaleId::generate(),
            ClientId::new(),
            "A-0002",
            None,
            vec![line(1, 2, Decimal::MAX)],
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn overflowing_unit_total_is_rejected() {
        let half = i64::MAX / 2 + 1;
        let err = Sale::record(
            SaleId::generate(),
            ClientId::new(),
            "A-0003",
            None,
            vec![line(1, half, dec!(0)), line(2, half, dec!(0))],
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidQuantity(_)));
    }

    #[test]
    fn settlement_sale_is_flagged() {
        let sale = Sale::settlement(
            SaleId::generate(),
            ClientId::new(),
            ProductId::generate(),
            20,
            dec!(15),
            Utc::now(),
        )
        .unwrap();
        assert!(sale.is_consignment_settlement());
        assert_eq!(sale.invoice_ref(), SETTLEMENT_INVOICE_REF);
        assert_eq!(sale.total(), dec!(300));
        assert_eq!(sale.lines()[0].format, SaleFormat::Unit);
    }
}
