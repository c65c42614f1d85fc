//! Large-sample inference for the median.

use serde::Serialize;

use crate::{
    distribution, error::StatsError, estimation::ConfidenceInterval, kde::GaussianKde,
    quantiles,
};

/// Asymptotic normal approximation of the sample median.
///
/// The sample median `m` is approximately normal with variance
/// `1 / (4 n f(m)^2)`, where `f` is the density at the median. `f(m)` is
/// estimated with a Gaussian KDE.
#[derive(Debug, Clone, Serialize)]
pub struct AsymptoticMedian {
    pub count: usize,
    pub median: f64,
    /// Estimated density at the median.
    pub density: f64,
    pub std_error: f64,
    pub confidence: f64,
    pub ci: ConfidenceInterval,
}

impl AsymptoticMedian {
    /// Smallest sample the approximation is computed for.
    pub const MIN_COUNT: usize = 10;

    /// Estimates the median distribution; non-finite values are dropped first.
    #[expect(clippy::cast_precision_loss)]
    pub fn new(values: &[f64], confidence: f64) -> Result<Self, StatsError> {
        let values = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        StatsError::require(Self::MIN_COUNT, values.len())?;

        let n = values.len();
        let median = quantiles::median(&values);
        let density = GaussianKde::new(&values)?.evaluate(median);
        let variance = 1.0 / (4.0 * n as f64 * density * density);
        let std_error = variance.sqrt();

        let z = distribution::normal_quantile(1.0 - (1.0 - confidence) / 2.0)?;
        Ok(Self {
            count: n,
            median,
            density,
            std_error,
            confidence,
            ci: ConfidenceInterval::around(median, z * std_error),
        })
    }
}
