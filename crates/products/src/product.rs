use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{aggregate_id, BrandId, DomainError, DomainResult, Entity, StockPool};

use crate::cost::blend;
use crate::money;
use crate::price::PriceHistoryEntry;

aggregate_id! {
    /// Product identifier.
    pub struct ProductId;
}

/// Format a sale line is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleFormat {
    Unit,
    Case,
}

/// Input for registering a product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub brand_id: BrandId,
    pub name: String,
    pub sale_price: Decimal,
    /// Reference unit cost; becomes the initial weighted-average cost.
    pub initial_cost: Decimal,
    /// Units already in the warehouse when the product is registered.
    pub initial_stock: i64,
    pub units_per_case: u32,
    pub min_stock: i64,
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if self.sale_price.is_sign_negative() {
            return Err(DomainError::validation("sale price must be non-negative"));
        }
        if self.initial_cost.is_sign_negative() {
            return Err(DomainError::validation("initial cost must be non-negative"));
        }
        if self.initial_stock < 0 {
            return Err(DomainError::invalid_quantity("initial stock cannot be negative"));
        }
        if self.units_per_case == 0 {
            return Err(DomainError::invalid_quantity("units per case must be at least 1"));
        }
        if self.min_stock < 0 {
            return Err(DomainError::invalid_quantity("minimum stock cannot be negative"));
        }
        Ok(())
    }
}

/// Signed change to a product's balances, optionally carrying a new average cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StockDelta {
    pub on_hand: i64,
    pub in_consignment: i64,
    pub new_avg_cost: Option<Decimal>,
}

impl StockDelta {
    /// Change to on-hand stock only.
    pub fn on_hand(delta: i64) -> Self {
        Self {
            on_hand: delta,
            ..Self::default()
        }
    }

    /// Goods leave the warehouse for a consignee.
    pub fn deliver(quantity: i64) -> Self {
        Self {
            on_hand: -quantity,
            in_consignment: quantity,
            new_avg_cost: None,
        }
    }

    /// Consigned goods are sold by the consignee.
    pub fn settle(quantity: i64) -> Self {
        Self {
            on_hand: 0,
            in_consignment: -quantity,
            new_avg_cost: None,
        }
    }

    /// Consigned goods come back to the warehouse.
    pub fn give_back(quantity: i64) -> Self {
        Self {
            on_hand: quantity,
            in_consignment: -quantity,
            new_avg_cost: None,
        }
    }

    pub fn with_avg_cost(mut self, cost: Decimal) -> Self {
        self.new_avg_cost = Some(cost);
        self
    }
}

/// Catalog entry: current stock balances, average cost and list price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    brand_id: BrandId,
    name: String,
    stock_on_hand: i64,
    stock_in_consignment: i64,
    weighted_avg_cost: Decimal,
    sale_price: Decimal,
    units_per_case: u32,
    min_stock: i64,
    created_at: DateTime<Utc>,
}

impl Product {
    /// Build a catalog entry from validated registration input.
    ///
    /// Initial stock enters at `initial_cost` through the regular cost blend.
    pub fn register(id: ProductId, input: &NewProduct, at: DateTime<Utc>) -> DomainResult<Self> {
        input.validate()?;
        let weighted_avg_cost = blend(0, Decimal::ZERO, input.initial_stock, input.initial_cost)?;

        Ok(Self {
            id,
            brand_id: input.brand_id,
            name: input.name.trim().to_string(),
            stock_on_hand: input.initial_stock,
            stock_in_consignment: 0,
            weighted_avg_cost,
            sale_price: input.sale_price,
            units_per_case: input.units_per_case,
            min_stock: input.min_stock,
            created_at: at,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn brand_id(&self) -> BrandId {
        self.brand_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stock_on_hand(&self) -> i64 {
        self.stock_on_hand
    }

    pub fn stock_in_consignment(&self) -> i64 {
        self.stock_in_consignment
    }

    pub fn weighted_avg_cost(&self) -> Decimal {
        self.weighted_avg_cost
    }

    pub fn sale_price(&self) -> Decimal {
        self.sale_price
    }

    pub fn units_per_case(&self) -> u32 {
        self.units_per_case
    }

    pub fn min_stock(&self) -> i64 {
        self.min_stock
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// List price of a full case.
    pub fn case_price(&self) -> DomainResult<Decimal> {
        money::line_amount(i64::from(self.units_per_case), self.sale_price)
    }

    pub fn is_below_minimum(&self) -> bool {
        self.stock_on_hand <= self.min_stock
    }

    /// On-hand stock valued at the current average cost.
    pub fn stock_value(&self) -> DomainResult<Decimal> {
        money::line_amount(self.stock_on_hand, self.weighted_avg_cost)
    }

    /// Consigned stock valued at the current average cost.
    pub fn consignment_cost_value(&self) -> DomainResult<Decimal> {
        money::line_amount(self.stock_in_consignment, self.weighted_avg_cost)
    }

    /// Consigned stock valued at the current list price.
    pub fn consignment_sale_value(&self) -> DomainResult<Decimal> {
        money::line_amount(self.stock_in_consignment, self.sale_price)
    }

    /// Resolve a quantity expressed in `format` to units.
    pub fn units_for(&self, format: SaleFormat, quantity_in_format: i64) -> DomainResult<i64> {
        if quantity_in_format <= 0 {
            return Err(DomainError::invalid_quantity(format!(
                "quantity must be positive (got {quantity_in_format})"
            )));
        }
        let factor = match format {
            SaleFormat::Unit => 1,
            SaleFormat::Case => i64::from(self.units_per_case),
        };
        quantity_in_format
            .checked_mul(factor)
            .ok_or_else(|| DomainError::invalid_quantity("unit count overflows"))
    }

    /// Apply a signed balance change. Nothing is mutated unless both balances
    /// stay non-negative.
    pub fn apply_delta(&mut self, delta: StockDelta) -> DomainResult<()> {
        let on_hand = self.checked_balance(self.stock_on_hand, delta.on_hand, StockPool::OnHand)?;
        let in_consignment = self.checked_balance(
            self.stock_in_consignment,
            delta.in_consignment,
            StockPool::InConsignment,
        )?;
        if let Some(cost) = delta.new_avg_cost {
            if cost.is_sign_negative() {
                return Err(DomainError::validation("average cost must be non-negative"));
            }
        }

        self.stock_on_hand = on_hand;
        self.stock_in_consignment = in_consignment;
        if let Some(cost) = delta.new_avg_cost {
            self.weighted_avg_cost = cost;
        }
        Ok(())
    }

    /// Change the list price, returning the history entry to record.
    pub fn set_sale_price(
        &mut self,
        new_price: Decimal,
        at: DateTime<Utc>,
    ) -> DomainResult<PriceHistoryEntry> {
        if new_price.is_sign_negative() {
            return Err(DomainError::validation("sale price must be non-negative"));
        }
        if new_price == self.sale_price {
            return Err(DomainError::validation("new price equals the current price"));
        }

        let entry = PriceHistoryEntry {
            product_id: self.id,
            previous_price: self.sale_price,
            new_price,
            changed_at: at,
        };
        self.sale_price = new_price;
        Ok(entry)
    }

    fn checked_balance(&self, current: i64, delta: i64, pool: StockPool) -> DomainResult<i64> {
        let next = current
            .checked_add(delta)
            .ok_or_else(|| DomainError::invalid_quantity("stock balance overflows"))?;
        if next < 0 {
            return Err(DomainError::insufficient(self.id.0, pool, -delta, current));
        }
        Ok(next)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_product(initial_stock: i64) -> NewProduct {
        NewProduct {
            brand_id: BrandId::new(),
            name: "Cola 1.5L".to_string(),
            sale_price: dec!(12.50),
            initial_cost: dec!(8),
            initial_stock,
            units_per_case: 6,
            min_stock: 10,
        }
    }

    fn product(initial_stock: i64) -> Product {
        Product::register(ProductId::generate(), &new_product(initial_stock), Utc::now()).unwrap()
    }

    #[test]
    fn register_takes_initial_stock_at_reference_cost() {
        let p = product(24);
        assert_eq!(p.stock_on_hand(), 24);
        assert_eq!(p.stock_in_consignment(), 0);
        assert_eq!(p.weighted_avg_cost(), dec!(8));
        assert_eq!(p.case_price().unwrap(), dec!(75));
        assert_eq!(p.stock_value().unwrap(), dec!(192));
    }

    #[test]
    fn register_rejects_blank_name() {
        let mut input = new_product(0);
        input.name = "   ".to_string();
        let err = Product::register(ProductId::generate(), &input, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn register_rejects_zero_units_per_case() {
        let mut input = new_product(0);
        input.units_per_case = 0;
        let err = Product::register(ProductId::generate(), &input, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidQuantity(_)));
    }

    #[test]
    fn case_format_multiplies_by_units_per_case() {
        let p = product(0);
        assert_eq!(p.units_for(SaleFormat::Case, 3).unwrap(), 18);
        assert_eq!(p.units_for(SaleFormat::Unit, 3).unwrap(), 3);
        assert!(matches!(
            p.units_for(SaleFormat::Unit, 0),
            Err(DomainError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn delta_that_would_go_negative_leaves_product_untouched() {
        let mut p = product(5);
        let before = p.clone();

        let err = p.apply_delta(StockDelta::deliver(6)).unwrap_err();
        match err {
            DomainError::InsufficientStock {
                pool,
                requested,
                available,
                ..
            } => {
                assert_eq!(pool, StockPool::OnHand);
                assert_eq!(requested, 6);
                assert_eq!(available, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(p, before);
    }

    #[test]
    fn consignment_balance_cannot_go_negative() {
        let mut p = product(5);
        p.apply_delta(StockDelta::deliver(2)).unwrap();
        let err = p.apply_delta(StockDelta::settle(3)).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InsufficientStock {
                pool: StockPool::InConsignment,
                ..
            }
        ));
        assert_eq!(p.stock_on_hand(), 3);
        assert_eq!(p.stock_in_consignment(), 2);
    }

    #[test]
    fn delivery_settlement_and_return_move_between_pools() {
        let mut p = product(10);
        p.apply_delta(StockDelta::deliver(6)).unwrap();
        p.apply_delta(StockDelta::settle(2)).unwrap();
        p.apply_delta(StockDelta::give_back(1)).unwrap();
        assert_eq!(p.stock_on_hand(), 5);
        assert_eq!(p.stock_in_consignment(), 3);
        assert_eq!(p.weighted_avg_cost(), dec!(8));
        assert_eq!(p.consignment_cost_value().unwrap(), dec!(24));
        assert_eq!(p.consignment_sale_value().unwrap(), dec!(37.5));
    }

    #[test]
    fn price_change_produces_history_entry() {
        let mut p = product(0);
        let entry = p.set_sale_price(dec!(14), Utc::now()).unwrap();
        assert_eq!(entry.previous_price, dec!(12.50));
        assert_eq!(entry.new_price, dec!(14));
        assert_eq!(p.sale_price(), dec!(14));
        assert_eq!(p.stock_on_hand(), 0);
    }

    #[test]
    fn unchanged_price_is_rejected() {
        let mut p = product(0);
        let err = p.set_sale_price(dec!(12.5), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn at_or_below_minimum_is_flagged() {
        let p = product(10);
        assert!(p.is_below_minimum());
        let p = product(11);
        assert!(!p.is_below_minimum());
    }
}
