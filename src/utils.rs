//! Small numeric helpers shared by the operations layer and the calling
//! engine: NaN-aware means and the order-statistic median both are built on.

use std::cmp::Ordering;

use log::*;
use num::Float;

/// Mean of `values` with NaN entries skipped.
///
/// Infinite entries participate and make the mean infinite. When nothing
/// countable remains the division yields NaN, which downstream comparisons
/// discard.
pub fn nan_mean<F, I>(values: I) -> F
where
    F: Float,
    I: IntoIterator<Item = F>, {
    let mut sum = F::zero();
    let mut count = F::zero();
    for value in values {
        if !value.is_nan() {
            sum = sum + value;
            count = count + F::one();
        }
    }
    if count == F::zero() {
        debug!("no values to average");
    }
    sum / count
}

/// Median of `values`, sorting the buffer in place.
///
/// An even-sized buffer averages the two middle order statistics; an empty
/// buffer returns 0.
pub fn median_in_place<F: Float>(values: &mut [F]) -> F {
    if values.is_empty() {
        return F::zero();
    }
    values.sort_unstable_by(|a, b| {
        a.partial_cmp(b).unwrap_or(Ordering::Equal)
    });
    let middle = values.len() / 2;
    if values.len() % 2 == 1 {
        values[middle]
    }
    else {
        (values[middle - 1] + values[middle]) / (F::one() + F::one())
    }
}
