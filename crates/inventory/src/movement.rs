use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_consignment::ConsignmentId;
use stockledger_core::{aggregate_id, DomainError, DomainResult};
use stockledger_products::ProductId;
use stockledger_purchasing::PurchaseId;
use stockledger_sales::SaleId;

aggregate_id! {
    /// Movement identifier.
    pub struct MovementId;
}

/// Closed set of movement kinds. The sign of a movement is fixed by its kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    Purchase,
    InitialStock,
    Sale,
    SaleConsignment,
    ConsignmentDelivery,
    ConsignmentReturn,
}

impl MovementKind {
    pub const ALL: [MovementKind; 6] = [
        MovementKind::Purchase,
        MovementKind::InitialStock,
        MovementKind::Sale,
        MovementKind::SaleConsignment,
        MovementKind::ConsignmentDelivery,
        MovementKind::ConsignmentReturn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MovementKind::Purchase => "PURCHASE",
            MovementKind::InitialStock => "INITIAL_STOCK",
            MovementKind::Sale => "SALE",
            MovementKind::SaleConsignment => "SALE_CONSIGNMENT",
            MovementKind::ConsignmentDelivery => "CONSIGNMENT_DELIVERY",
            MovementKind::ConsignmentReturn => "CONSIGNMENT_RETURN",
        }
    }

    /// Stock enters the warehouse (positive quantity).
    pub fn is_inbound(self) -> bool {
        match self {
            MovementKind::Purchase | MovementKind::InitialStock | MovementKind::ConsignmentReturn => true,
            MovementKind::Sale | MovementKind::SaleConsignment | MovementKind::ConsignmentDelivery => false,
        }
    }

    pub fn sign(self) -> i64 {
        if self.is_inbound() { 1 } else { -1 }
    }

    /// Whether the movement changes on-hand stock. Settlements draw from
    /// consignment stock, which already left the warehouse at delivery.
    pub fn affects_on_hand(self) -> bool {
        match self {
            MovementKind::Purchase
            | MovementKind::InitialStock
            | MovementKind::Sale
            | MovementKind::ConsignmentDelivery
            | MovementKind::ConsignmentReturn => true,
            MovementKind::SaleConsignment => false,
        }
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operation a movement belongs to. Cancelling an operation removes
/// exactly the movements carrying its source.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum MovementSource {
    Sale(SaleId),
    Purchase(PurchaseId),
    Consignment(ConsignmentId),
    ProductRegistration(ProductId),
}

/// A movement about to be appended (no sequence yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMovement {
    pub product_id: ProductId,
    pub kind: MovementKind,
    pub quantity: i64,
    pub source: MovementSource,
    pub occurred_at: DateTime<Utc>,
}

impl NewMovement {
    /// Build from a positive unit count; the sign comes from `kind`.
    pub fn new(
        product_id: ProductId,
        kind: MovementKind,
        units: i64,
        source: MovementSource,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if units <= 0 {
            return Err(DomainError::invalid_quantity(format!(
                "{kind} movement needs a positive unit count (got {units})"
            )));
        }
        let movement = Self {
            product_id,
            kind,
            quantity: units * kind.sign(),
            source,
            occurred_at,
        };
        Ok(movement)
    }

    /// Reject zero quantities and signs that disagree with the kind.
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity == 0 {
            return Err(DomainError::invalid_quantity(format!(
                "{} movement with zero quantity",
                self.kind
            )));
        }
        if self.quantity.signum() != self.kind.sign() {
            return Err(DomainError::invalid_quantity(format!(
                "{} movement must be {} (got {})",
                self.kind,
                if self.kind.is_inbound() { "positive" } else { "negative" },
                self.quantity
            )));
        }
        Ok(())
    }
}

/// Immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    /// Monotonic, assigned on append.
    pub sequence: u64,
    pub product_id: ProductId,
    pub kind: MovementKind,
    pub quantity: i64,
    pub source: MovementSource,
    pub occurred_at: DateTime<Utc>,
}

impl Movement {
    pub fn record(id: MovementId, sequence: u64, new: NewMovement) -> DomainResult<Self> {
        new.validate()?;
        Ok(Self {
            id,
            sequence,
            product_id: new.product_id,
            kind: new.kind,
            quantity: new.quantity,
            source: new.source,
            occurred_at: new.occurred_at,
        })
    }

    /// Absolute number of units moved.
    pub fn units(&self) -> i64 {
        self.quantity.abs()
    }
}
