use num_traits::{Float, NumCast, One, Zero};
use single_utilities::traits::FloatOps;
use std::cmp::Ordering;

/// Present (non-NaN) values, sorted ascending.
pub fn sorted_present<T>(values: impl IntoIterator<Item = T>) -> Vec<T>
where
    T: FloatOps,
{
    let mut present: Vec<T> = values.into_iter().filter(|v| !Float::is_nan(*v)).collect();
    present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    present
}

/// Quantile of an ascending slice by linear interpolation between closest ranks.
///
/// Position is `(n - 1) * p`; the result lies between the two neighbouring
/// order statistics. Returns NaN for an empty slice.
pub fn quantile_sorted<T>(sorted: &[T], p: T) -> T
where
    T: FloatOps,
{
    let n = sorted.len();
    if n == 0 {
        return <T as Float>::nan();
    }
    if n == 1 {
        return sorted[0];
    }

    let last = <T as NumCast>::from(n - 1).unwrap_or_else(<T as Zero>::zero);
    let position = Float::max(Float::min(p, <T as One>::one()), <T as Zero>::zero()) * last;
    let lower = Float::floor(position);
    let fraction = position - lower;
    let lower_idx = lower.to_usize().unwrap_or(0).min(n - 1);
    let upper_idx = (lower_idx + 1).min(n - 1);

    sorted[lower_idx] + (sorted[upper_idx] - sorted[lower_idx]) * fraction
}

/// First and third quartile of the present values.
pub fn quartiles<T>(values: impl IntoIterator<Item = T>) -> (T, T)
where
    T: FloatOps,
{
    let sorted = sorted_present(values);
    let q1 = <T as NumCast>::from(0.25).unwrap_or_else(<T as Zero>::zero);
    let q3 = <T as NumCast>::from(0.75).unwrap_or_else(<T as One>::one);
    (quantile_sorted(&sorted, q1), quantile_sorted(&sorted, q3))
}
