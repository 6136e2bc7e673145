//! Checked money arithmetic. Amounts that leave the `Decimal` range are
//! rejected instead of panicking.

use rust_decimal::Decimal;

use stockledger_core::{DomainError, DomainResult};

fn out_of_range() -> DomainError {
    DomainError::validation("amount exceeds the supported decimal range")
}

/// `units × unit_amount`.
pub fn line_amount(units: i64, unit_amount: Decimal) -> DomainResult<Decimal> {
    Decimal::from(units)
        .checked_mul(unit_amount)
        .ok_or_else(out_of_range)
}

/// Σ of fallible amounts, stopping at the first error.
pub fn sum_amounts<I>(amounts: I) -> DomainResult<Decimal>
where
    I: IntoIterator<Item = DomainResult<Decimal>>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, |acc, amount| {
        acc.checked_add(amount?).ok_or_else(out_of_range)
    })
}

pub fn add(a: Decimal, b: Decimal) -> DomainResult<Decimal> {
    a.checked_add(b).ok_or_else(out_of_range)
}
