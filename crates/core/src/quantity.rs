//! Checked unit arithmetic shared by drafts, documents and the coordinator.

use crate::error::{DomainError, DomainResult};

/// Σ of unit counts; overflow is an `InvalidQuantity`.
pub fn checked_total<I>(quantities: I) -> DomainResult<i64>
where
    I: IntoIterator<Item = i64>,
{
    quantities.into_iter().try_fold(0i64, |acc, q| {
        acc.checked_add(q)
            .ok_or_else(|| DomainError::invalid_quantity("unit total overflows"))
    })
}

/// Units summed per key, in order of first appearance.
pub fn sum_by_key<K, I>(entries: I) -> DomainResult<Vec<(K, i64)>>
where
    K: Copy + Eq,
    I: IntoIterator<Item = (K, i64)>,
{
    let mut out: Vec<(K, i64)> = Vec::new();
    for (key, units) in entries {
        match out.iter_mut().find(|(k, _)| *k == key) {
            Some((_, total)) => {
                *total = total.checked_add(units).ok_or_else(|| {
                    DomainError::invalid_quantity("aggregated unit count overflows")
                })?;
            }
            None => out.push((key, units)),
        }
    }
    Ok(out)
}
