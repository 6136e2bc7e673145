use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{aggregate_id, checked_total, ClientId, DomainError, DomainResult, Entity};
use stockledger_products::ProductId;

use crate::draft::ConsignmentDraft;

aggregate_id! {
    /// Consignment header identifier.
    pub struct ConsignmentId;
}

aggregate_id! {
    /// Consignment line identifier; settle/return address lines directly.
    pub struct ConsignmentLineId;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsignmentStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsignmentLine {
    pub id: ConsignmentLineId,
    pub product_id: ProductId,
    /// Units originally delivered on this line.
    pub delivered: i64,
    /// Units still at the client location. Always > 0 while the line exists.
    pub quantity_outstanding: i64,
}

/// Result of taking units off a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRelease {
    pub product_id: ProductId,
    pub quantity: i64,
    /// The line reached zero and was removed.
    pub line_removed: bool,
    /// The header transitioned to `CLOSED`.
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consignment {
    id: ConsignmentId,
    client_id: ClientId,
    status: ConsignmentStatus,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    lines: Vec<ConsignmentLine>,
}

impl Consignment {
    /// Open an ACTIVE consignment with one line per draft row.
    pub fn open(id: ConsignmentId, draft: &ConsignmentDraft) -> DomainResult<Self> {
        draft.validate()?;
        checked_total(draft.lines.iter().map(|l| l.quantity))?;

        let lines = draft
            .lines
            .iter()
            .map(|l| ConsignmentLine {
                id: ConsignmentLineId::generate(),
                product_id: l.product_id,
                delivered: l.quantity,
                quantity_outstanding: l.quantity,
            })
            .collect();

        Ok(Self {
            id,
            client_id: draft.client_id,
            status: ConsignmentStatus::Active,
            created_at: draft.occurred_at,
            closed_at: None,
            lines,
        })
    }

    pub fn id_typed(&self) -> ConsignmentId {
        self.id
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn status(&self) -> ConsignmentStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == ConsignmentStatus::Active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn lines(&self) -> &[ConsignmentLine] {
        &self.lines
    }

    pub fn line(&self, line_id: ConsignmentLineId) -> Option<&ConsignmentLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    /// Bounded by the delivered total, which `open` checks for overflow.
    pub fn outstanding_units(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity_outstanding).sum()
    }

    /// Take `quantity` units off a line (settlement or return).
    ///
    /// Removes the line when it reaches zero and closes the header when the
    /// last line goes.
    pub fn take(
        &mut self,
        line_id: ConsignmentLineId,
        quantity: i64,
        at: DateTime<Utc>,
    ) -> DomainResult<LineRelease> {
        if self.status == ConsignmentStatus::Closed {
            return Err(DomainError::validation(format!(
                "consignment {} is closed",
                self.id
            )));
        }
        let idx = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| DomainError::not_found("consignment line", line_id))?;

        let line = &mut self.lines[idx];
        if quantity <= 0 || quantity > line.quantity_outstanding {
            return Err(DomainError::invalid_quantity(format!(
                "quantity must be in 1..={} (got {quantity})",
                line.quantity_outstanding
            )));
        }
        line.quantity_outstanding -= quantity;
        let product_id = line.product_id;

        let line_removed = line.quantity_outstanding == 0;
        if line_removed {
            self.lines.remove(idx);
        }
        let closed = self.lines.is_empty();
        if closed {
            self.status = ConsignmentStatus::Closed;
            self.closed_at = Some(at);
        }

        Ok(LineRelease {
            product_id,
            quantity,
            line_removed,
            closed,
        })
    }
}

impl Entity for Consignment {
    type Id = ConsignmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(qtys: &[i64]) -> Consignment {
        let draft = qtys.iter().fold(ConsignmentDraft::new(ClientId::new()), |d, q| {
            d.line(ProductId::generate(), *q)
        });
        Consignment::open(ConsignmentId::generate(), &draft).unwrap()
    }

    #[test]
    fn opens_active_with_outstanding_equal_to_delivered() {
        let c = open(&[10, 4]);
        assert!(c.is_active());
        assert_eq!(c.outstanding_units(), 14);
        assert!(c.lines().iter().all(|l| l.delivered == l.quantity_outstanding));
    }

    #[test]
    fn partial_take_keeps_line() {
        let mut c = open(&[10]);
        let line_id = c.lines()[0].id;
        let release = c.take(line_id, 4, Utc::now()).unwrap();
        assert!(!release.line_removed);
        assert!(!release.closed);
        assert_eq!(c.line(line_id).unwrap().quantity_outstanding, 6);
    }

    #[test]
    fn taking_last_unit_removes_line_and_closes() {
        let mut c = open(&[10]);
        let line_id = c.lines()[0].id;
        let at = Utc::now();
        let release = c.take(line_id, 10, at).unwrap();
        assert!(release.line_removed);
        assert!(release.closed);
        assert!(c.lines().is_empty());
        assert_eq!(c.status(), ConsignmentStatus::Closed);
        assert_eq!(c.closed_at(), Some(at));
    }

    #[test]
    fn header_stays_active_while_other_lines_remain() {
        let mut c = open(&[3, 5]);
        let first = c.lines()[0].id;
        let release = c.take(first, 3, Utc::now()).unwrap();
        assert!(release.line_removed);
        assert!(!release.closed);
        assert!(c.is_active());
    }

    #[test]
    fn over_take_is_invalid_quantity() {
        let mut c = open(&[2]);
        let line_id = c.lines()[0].id;
        assert!(matches!(
            c.take(line_id, 3, Utc::now()),
            Err(DomainError::InvalidQuantity(_))
        ));
        assert!(matches!(
            c.take(line_id, 0, Utc::now()),
            Err(DomainError::InvalidQuantity(_))
        ));
        assert_eq!(c.outstanding_units(), 2);
    }

    #[test]
    fn overflowing_delivery_total_is_rejected() {
        let half = i64::MAX / 2 + 1;
        let draft = ConsignmentDraft::new(ClientId::new())
            .line(ProductId::generate(), half)
            .line(ProductId::generate(), half);
        let err = Consignment::open(ConsignmentId::generate(), &draft).unwrap_err();
        assert!(matches!(err, DomainError::InvalidQuantity(_)));
    }

    #[test]
    fn closed_consignment_rejects_further_takes() {
        let mut c = open(&[1]);
        let line_id = c.lines()[0].id;
        c.take(line_id, 1, Utc::now()).unwrap();
        assert!(matches!(
            c.take(line_id, 1, Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn unknown_line_is_not_found() {
        let mut c = open(&[1]);
        assert!(matches!(
            c.take(ConsignmentLineId::generate(), 1, Utc::now()),
            Err(DomainError::NotFound { .. })
        ));
    }
}
