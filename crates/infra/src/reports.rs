//! Dashboard reports: KPIs, consignment exposure, per-product stock status,
//! cost variation, low stock, consignment aging and movement totals.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stockledger_consignment::{AgingPolicy, ConsignmentAge, ConsignmentId, ConsignmentLineId};
use stockledger_core::{checked_total, ClientId, DomainError, DomainResult};
use stockledger_inventory::{MovementFilter, MovementKind, MovementOrder};
use stockledger_products::{money, Product, ProductId};
use stockledger_purchasing::PurchaseId;

use crate::config::LedgerConfig;
use crate::error::CommandError;
use crate::store::{Datastore, StoreState};

/// Percentage beyond which a cost change is flagged in [`CostVariationRow`].
pub const COST_VARIATION_THRESHOLD_PCT: Decimal = Decimal::TEN;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardKpis {
    pub window_start: DateTime<Utc>,
    pub window_days: i64,
    /// Σ sale line subtotals in the window (settlements included).
    pub revenue: Decimal,
    /// Units sold in the window valued at the current average cost.
    pub cost_of_sales: Decimal,
    pub gross_margin: Decimal,
    /// On-hand stock valued at average cost.
    pub stock_value: Decimal,
    pub products_below_minimum: usize,
    pub consignment: ConsignmentExposure,
}

/// Goods sitting at client locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConsignmentExposure {
    pub units_at_clients: i64,
    /// Consigned units at average cost.
    pub capital_at_risk: Decimal,
    /// Consigned units at list price.
    pub potential_sale: Decimal,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    /// At or below minimum stock.
    Low,
    /// In stock but nothing sold during the window.
    NoTurnover,
    Ok,
}

impl StockStatus {
    fn classify(product: &Product, sold_in_window: i64) -> Self {
        if product.stock_on_hand() <= 0 {
            StockStatus::OutOfStock
        } else if product.is_below_minimum() {
            StockStatus::Low
        } else if sold_in_window == 0 {
            StockStatus::NoTurnover
        } else {
            StockStatus::Ok
        }
    }
}

/// One catalog row of the stock dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockStatusRow {
    pub product_id: ProductId,
    pub name: String,
    pub stock_on_hand: i64,
    pub stock_in_consignment: i64,
    pub sold_in_window: i64,
    pub total_sold: i64,
    pub weighted_avg_cost: Decimal,
    pub sale_price: Decimal,
    /// `(price - cost) / price × 100`, one decimal; `None` at a zero price.
    pub margin_pct: Option<Decimal>,
    pub stock_value: Decimal,
    pub status: StockStatus,
    /// On-hand stock divided by the window's daily sales rate, one decimal.
    pub days_of_stock: Option<Decimal>,
}

/// Average cost against the cost of the latest purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostVariationRow {
    pub product_id: ProductId,
    pub name: String,
    pub weighted_avg_cost: Decimal,
    pub last_purchase_cost: Decimal,
    pub last_purchased_at: DateTime<Utc>,
    /// `last_purchase_cost - weighted_avg_cost`.
    pub difference: Decimal,
    /// `difference / weighted_avg_cost × 100`, one decimal; `None` at zero cost.
    pub variation_pct: Option<Decimal>,
    /// `|variation_pct|` above [`COST_VARIATION_THRESHOLD_PCT`].
    pub significant: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockRow {
    pub product_id: ProductId,
    pub name: String,
    pub stock_on_hand: i64,
    pub min_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgingRow {
    pub consignment_id: ConsignmentId,
    pub line_id: ConsignmentLineId,
    pub client_id: ClientId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity_outstanding: i64,
    pub age_days: i64,
    pub status: ConsignmentAge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementTotal {
    pub product_id: ProductId,
    pub kind: MovementKind,
    /// Absolute units moved.
    pub units: i64,
}

/// Read-side dashboard over committed state.
///
/// ## Consistency
///
/// Every report reads one snapshot, so its figures agree with each other even
/// while writers commit. Reports never write.
///
/// ## Windows
///
/// Windowed figures cover `[now - kpi_window_days, now]`. A window that
/// cannot be represented as a timestamp is a `Validation` error.
///
/// ## Money
///
/// Amounts use checked decimal arithmetic; a total outside the `Decimal`
/// range is a `Validation` error.
#[derive(Debug, Clone)]
pub struct Reports<S> {
    store: S,
    config: LedgerConfig,
}

impl<S> Reports<S>
where
    S: Datastore,
{
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    fn window_start(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, CommandError> {
        Duration::try_days(self.config.kpi_window_days)
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                CommandError::Validation(format!(
                    "kpi window of {} days is out of range",
                    self.config.kpi_window_days
                ))
            })
    }

    /// KPIs over the configured trailing window ending at `now`.
    pub fn kpis(&self, now: DateTime<Utc>) -> Result<DashboardKpis, CommandError> {
        let window_start = self.window_start(now)?;
        let snapshot = self.store.snapshot()?;

        let mut revenue = Decimal::ZERO;
        let mut cost_of_sales = Decimal::ZERO;
        for sale in snapshot
            .sales()
            .values()
            .filter(|s| s.occurred_at() >= window_start && s.occurred_at() <= now)
        {
            for line in sale.lines() {
                revenue = money::add(revenue, line.subtotal()?)?;
                let avg_cost = snapshot.product(line.product_id)?.weighted_avg_cost();
                cost_of_sales = money::add(cost_of_sales, money::line_amount(line.units, avg_cost)?)?;
            }
        }

        let products = snapshot.products();
        Ok(DashboardKpis {
            window_start,
            window_days: self.config.kpi_window_days,
            revenue,
            cost_of_sales,
            gross_margin: revenue
                .checked_sub(cost_of_sales)
                .ok_or_else(|| DomainError::validation("gross margin out of range"))?,
            stock_value: money::sum_amounts(products.values().map(Product::stock_value))?,
            products_below_minimum: products.values().filter(|p| p.is_below_minimum()).count(),
            consignment: exposure(&snapshot)?,
        })
    }

    /// Units, cost and list value of everything out on consignment.
    pub fn consignment_exposure(&self) -> Result<ConsignmentExposure, CommandError> {
        let snapshot = self.store.snapshot()?;
        Ok(exposure(&snapshot)?)
    }

    /// Every product with its sales rotation and stock status, best sellers
    /// in the window first.
    pub fn stock_status(&self, now: DateTime<Utc>) -> Result<Vec<StockStatusRow>, CommandError> {
        let window_start = self.window_start(now)?;
        let snapshot = self.store.snapshot()?;

        let mut sold_total: HashMap<ProductId, i64> = HashMap::new();
        let mut sold_window: HashMap<ProductId, i64> = HashMap::new();
        for sale in snapshot.sales().values() {
            let in_window = sale.occurred_at() >= window_start && sale.occurred_at() <= now;
            for line in sale.lines() {
                bump(&mut sold_total, line.product_id, line.units)?;
                if in_window {
                    bump(&mut sold_window, line.product_id, line.units)?;
                }
            }
        }

        let mut rows = snapshot
            .products()
            .values()
            .map(|p| -> DomainResult<StockStatusRow> {
                let id = p.id_typed();
                let sold_in_window = sold_window.get(&id).copied().unwrap_or(0);
                Ok(StockStatusRow {
                    product_id: id,
                    name: p.name().to_string(),
                    stock_on_hand: p.stock_on_hand(),
                    stock_in_consignment: p.stock_in_consignment(),
                    sold_in_window,
                    total_sold: sold_total.get(&id).copied().unwrap_or(0),
                    weighted_avg_cost: p.weighted_avg_cost(),
                    sale_price: p.sale_price(),
                    margin_pct: percent_of(p.sale_price() - p.weighted_avg_cost(), p.sale_price()),
                    stock_value: p.stock_value()?,
                    status: StockStatus::classify(p, sold_in_window),
                    days_of_stock: days_of_stock(p.stock_on_hand(), sold_in_window, self.config.kpi_window_days),
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;
        rows.sort_by(|a, b| b.sold_in_window.cmp(&a.sold_in_window).then(a.name.cmp(&b.name)));
        Ok(rows)
    }

    /// Products in stock that have been purchased, largest cost swing first.
    pub fn cost_variation(&self) -> Result<Vec<CostVariationRow>, CommandError> {
        let snapshot = self.store.snapshot()?;

        // Latest purchase per product; ids break timestamp ties.
        let mut latest: HashMap<ProductId, (DateTime<Utc>, PurchaseId, Decimal)> = HashMap::new();
        for purchase in snapshot.purchases().values() {
            let key = (purchase.occurred_at(), purchase.id_typed());
            for line in purchase.lines() {
                let entry = latest
                    .entry(line.product_id)
                    .or_insert((key.0, key.1, line.net_unit_cost));
                if key >= (entry.0, entry.1) {
                    *entry = (key.0, key.1, line.net_unit_cost);
                }
            }
        }

        let mut rows = Vec::new();
        for (product_id, (last_purchased_at, _, last_purchase_cost)) in latest {
            let product = snapshot.product(product_id)?;
            if product.stock_on_hand() <= 0 {
                continue;
            }
            let avg = product.weighted_avg_cost();
            let difference = last_purchase_cost - avg;
            let variation_pct = percent_of(difference, avg);
            rows.push(CostVariationRow {
                product_id,
                name: product.name().to_string(),
                weighted_avg_cost: avg,
                last_purchase_cost,
                last_purchased_at,
                difference,
                variation_pct,
                significant: variation_pct.is_some_and(|pct| pct.abs() > COST_VARIATION_THRESHOLD_PCT),
            });
        }
        rows.sort_by(|a, b| {
            let swing = |r: &CostVariationRow| r.variation_pct.map(|p| p.abs()).unwrap_or_default();
            swing(b).cmp(&swing(a)).then(a.name.cmp(&b.name))
        });
        Ok(rows)
    }

    /// Products at or below their minimum, lowest stock first.
    pub fn low_stock(&self) -> Result<Vec<LowStockRow>, CommandError> {
        let snapshot = self.store.snapshot()?;
        let mut rows: Vec<LowStockRow> = snapshot
            .products()
            .values()
            .filter(|p| p.is_below_minimum())
            .map(|p| LowStockRow {
                product_id: p.id_typed(),
                name: p.name().to_string(),
                stock_on_hand: p.stock_on_hand(),
                min_stock: p.min_stock(),
            })
            .collect();
        rows.sort_by(|a, b| a.stock_on_hand.cmp(&b.stock_on_hand).then(a.name.cmp(&b.name)));
        Ok(rows)
    }

    /// One row per outstanding consignment line, oldest first.
    pub fn consignment_aging(&self, now: DateTime<Utc>) -> Result<Vec<AgingRow>, CommandError> {
        let policy: AgingPolicy = self.config.aging_policy()?;
        let snapshot = self.store.snapshot()?;

        let mut rows = Vec::new();
        for consignment in snapshot.consignments().values().filter(|c| c.is_active()) {
            let age_days = AgingPolicy::age_days(consignment.created_at(), now);
            for line in consignment.lines() {
                rows.push(AgingRow {
                    consignment_id: consignment.id_typed(),
                    line_id: line.id,
                    client_id: consignment.client_id(),
                    product_id: line.product_id,
                    product_name: snapshot.product(line.product_id)?.name().to_string(),
                    quantity_outstanding: line.quantity_outstanding,
                    age_days,
                    status: policy.classify(age_days),
                });
            }
        }
        rows.sort_by(|a, b| {
            b.age_days
                .cmp(&a.age_days)
                .then(a.consignment_id.cmp(&b.consignment_id))
                .then(a.line_id.cmp(&b.line_id))
        });
        Ok(rows)
    }

    /// Units moved per product and kind since `since` (inclusive).
    pub fn movement_breakdown(&self, since: DateTime<Utc>) -> Result<Vec<MovementTotal>, CommandError> {
        let snapshot = self.store.snapshot()?;
        let filter = MovementFilter::all().between(Some(since), None);

        let mut totals: BTreeMap<(ProductId, MovementKind), i64> = BTreeMap::new();
        for movement in snapshot.movements_matching(&filter, MovementOrder::Ascending) {
            let total = totals.entry((movement.product_id, movement.kind)).or_default();
            *total = total
                .checked_add(movement.units())
                .ok_or_else(|| DomainError::invalid_quantity("movement total overflows"))?;
        }
        Ok(totals
            .into_iter()
            .map(|((product_id, kind), units)| MovementTotal {
                product_id,
                kind,
                units,
            })
            .collect())
    }
}

fn exposure(state: &StoreState) -> DomainResult<ConsignmentExposure> {
    let products = state.products();
    Ok(ConsignmentExposure {
        units_at_clients: checked_total(products.values().map(Product::stock_in_consignment))?,
        capital_at_risk: money::sum_amounts(products.values().map(Product::consignment_cost_value))?,
        potential_sale: money::sum_amounts(products.values().map(Product::consignment_sale_value))?,
    })
}

fn bump(totals: &mut HashMap<ProductId, i64>, product_id: ProductId, units: i64) -> DomainResult<()> {
    let total = totals.entry(product_id).or_default();
    *total = total
        .checked_add(units)
        .ok_or_else(|| DomainError::invalid_quantity("sold unit total overflows"))?;
    Ok(())
}

/// `part / whole × 100` rounded to one decimal.
fn percent_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole.is_zero() {
        return None;
    }
    part.checked_div(whole)?
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|pct| pct.round_dp(1))
}

fn days_of_stock(on_hand: i64, sold_in_window: i64, window_days: i64) -> Option<Decimal> {
    if sold_in_window <= 0 {
        return None;
    }
    Decimal::from(on_hand)
        .checked_mul(Decimal::from(window_days))?
        .checked_div(Decimal::from(sold_in_window))
        .map(|days| days.round_dp(1))
}
