//! Type-7 sample quantiles: linear interpolation between order statistics,
//! so the 0.5 quantile is the usual median.

/// Computes a single quantile from sorted data by linear interpolation.
///
/// `probability` is clamped to `0.0..=1.0`. Returns `f64::NAN` for an empty
/// slice.
///
/// # Examples
///
/// ```
/// use pairstat_stats::quantiles::quantile_sorted;
///
/// let values = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(quantile_sorted(&values, 0.5), 3.0);
/// assert_eq!(quantile_sorted(&values, 0.25), 2.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn quantile_sorted(sorted_values: &[f64], probability: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let probability = probability.clamp(0.0, 1.0);
    let h = (sorted_values.len() - 1) as f64 * probability;
    let lower = h.floor() as usize;
    let upper = (lower + 1).min(sorted_values.len() - 1);
    let frac = h - h.floor();
    sorted_values[lower] + frac * (sorted_values[upper] - sorted_values[lower])
}

/// Median of sorted data; `f64::NAN` when empty.
#[must_use]
pub fn median_sorted(sorted_values: &[f64]) -> f64 {
    quantile_sorted(sorted_values, 0.5)
}

/// Median of unsorted data; `f64::NAN` when empty.
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    median_sorted(&sorted)
}
