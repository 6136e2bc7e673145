//! Weighted-average cost blending.
//!
//! Only stock acquisitions (purchases, initial stock) change a product's cost.
//! Sales and consignment movements move existing inventory and never call
//! into this module.

use rust_decimal::Decimal;

use stockledger_core::{DomainError, DomainResult};

/// Blend the current average cost with an incoming acquisition.
///
/// `(stock × avg + qty × cost) / (stock + qty)`, in exact decimal arithmetic.
/// When `stock + qty == 0` the incoming unit cost is returned unchanged.
pub fn blend(
    current_stock: i64,
    current_avg_cost: Decimal,
    incoming_qty: i64,
    incoming_unit_cost: Decimal,
) -> DomainResult<Decimal> {
    let total = current_stock
        .checked_add(incoming_qty)
        .ok_or_else(|| DomainError::invalid_quantity("stock total overflows"))?;
    if total == 0 {
        return Ok(incoming_unit_cost);
    }

    let overflow = || DomainError::validation("cost blend overflows decimal range");
    let held = Decimal::from(current_stock)
        .checked_mul(current_avg_cost)
        .ok_or_else(overflow)?;
    let incoming = Decimal::from(incoming_qty)
        .checked_mul(incoming_unit_cost)
        .ok_or_else(overflow)?;
    let value = held.checked_add(incoming).ok_or_else(overflow)?;

    value
        .checked_div(Decimal::from(total))
        .map(|avg| avg.normalize())
        .ok_or_else(overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn first_acquisition_takes_incoming_cost() {
        assert_eq!(blend(0, dec!(0), 12, dec!(50)).unwrap(), dec!(50));
    }

    #[test]
    fn equal_quantities_average_the_costs() {
        assert_eq!(blend(12, dec!(50), 12, dec!(70)).unwrap(), dec!(60));
    }

    #[test]
    fn zero_total_returns_incoming_cost() {
        assert_eq!(blend(0, dec!(12.5), 0, dec!(9.99)).unwrap(), dec!(9.99));
    }

    #[test]
    fn keeps_exact_fractions() {
        // 3 @ 1.00 + 1 @ 2.00 = 5.00 / 4
        assert_eq!(blend(3, dec!(1.00), 1, dec!(2.00)).unwrap(), dec!(1.25));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the blended cost always lies between the two input costs.
        #[test]
        fn blend_is_bounded_by_inputs(
            stock in 1i64..100_000,
            qty in 1i64..100_000,
            avg_cents in 0i64..1_000_000,
            cost_cents in 0i64..1_000_000,
        ) {
            let avg = Decimal::new(avg_cents, 2);
            let cost = Decimal::new(cost_cents, 2);
            let out = blend(stock, avg, qty, cost).unwrap();

            let lo = avg.min(cost);
            let hi = avg.max(cost);
            prop_assert!(out >= lo && out <= hi, "{out} not within [{lo}, {hi}]");
        }

        /// Property: blending at the current average leaves it unchanged.
        #[test]
        fn blend_at_same_cost_is_identity(
            stock in 0i64..100_000,
            qty in 1i64..100_000,
            cents in 0i64..1_000_000,
        ) {
            let cost = Decimal::new(cents, 2);
            prop_assert_eq!(blend(stock, cost, qty, cost).unwrap(), cost);
        }
    }
}
