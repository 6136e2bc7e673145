use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_products::ProductId;

use crate::movement::{Movement, MovementKind};

/// Ordering by `(occurred_at, sequence)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementOrder {
    /// Replay order.
    #[default]
    Ascending,
    /// Audit views, newest first.
    Descending,
}

/// Ledger query filter. Every unset field matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<ProductId>,
    pub kinds: Option<Vec<MovementKind>>,
    /// Inclusive lower bound.
    pub occurred_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub occurred_before: Option<DateTime<Utc>>,
}

impl MovementFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_product(product_id: ProductId) -> Self {
        Self {
            product_id: Some(product_id),
            ..Self::default()
        }
    }

    pub fn kinds(mut self, kinds: impl IntoIterator<Item = MovementKind>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> Self {
        self.occurred_after = from;
        self.occurred_before = until;
        self
    }

    pub fn matches(&self, movement: &Movement) -> bool {
        if self.product_id.is_some_and(|p| p != movement.product_id) {
            return false;
        }
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&movement.kind) {
                return false;
            }
        }
        if self.occurred_after.is_some_and(|t| movement.occurred_at < t) {
            return false;
        }
        if self.occurred_before.is_some_and(|t| movement.occurred_at >= t) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::{MovementId, MovementSource, NewMovement};
    use chrono::Duration;
    use stockledger_sales::SaleId;

    fn movement(product_id: ProductId, kind: MovementKind, at: DateTime<Utc>) -> Movement {
        let new = NewMovement::new(product_id, kind, 1, MovementSource::Sale(SaleId::generate()), at).unwrap();
        Movement::record(MovementId::generate(), 1, new).unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        let m = movement(ProductId::generate(), MovementKind::Sale, Utc::now());
        assert!(MovementFilter::all().matches(&m));
    }

    #[test]
    fn product_and_kind_restrict() {
        let p = ProductId::generate();
        let m = movement(p, MovementKind::Sale, Utc::now());
        assert!(MovementFilter::for_product(p).kinds([MovementKind::Sale]).matches(&m));
        assert!(!MovementFilter::for_product(p).kinds([MovementKind::Purchase]).matches(&m));
        assert!(!MovementFilter::for_product(ProductId::generate()).matches(&m));
    }

    #[test]
    fn date_range_is_half_open() {
        let t = Utc::now();
        let m = movement(ProductId::generate(), MovementKind::Sale, t);
        assert!(MovementFilter::all().between(Some(t), None).matches(&m));
        assert!(!MovementFilter::all().between(None, Some(t)).matches(&m));
        assert!(MovementFilter::all().between(None, Some(t + Duration::seconds(1))).matches(&m));
    }
}
