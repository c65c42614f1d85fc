//! Point and interval estimates for the parameters of a normal distribution.

use serde::Serialize;

use crate::{descriptive, distribution, error::StatsError};

/// A two-sided confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    #[must_use]
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Symmetric interval `center ± half_width`.
    #[must_use]
    pub fn around(center: f64, half_width: f64) -> Self {
        Self::new(center - half_width, center + half_width)
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Estimates of mean, variance and standard deviation under normality.
///
/// Intervals use Student's t for the mean and the chi-squared pivot
/// `(n - 1) s^2 / sigma^2` for the variance.
#[derive(Debug, Clone, Serialize)]
pub struct NormalEstimate {
    pub count: usize,
    pub confidence: f64,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub mean_ci: ConfidenceInterval,
    pub variance_ci: ConfidenceInterval,
    pub std_dev_ci: ConfidenceInterval,
}

impl NormalEstimate {
    /// Estimates the parameters from `values` at the given confidence level.
    ///
    /// # Examples
    ///
    /// ```
    /// use pairstat_stats::estimation::NormalEstimate;
    ///
    /// let estimate = NormalEstimate::new(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.95).unwrap();
    /// assert_eq!(estimate.mean, 3.0);
    /// assert_eq!(estimate.variance, 2.5);
    /// assert!(estimate.mean_ci.contains(3.0));
    /// assert!(estimate.variance_ci.contains(2.5));
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn new(values: &[f64], confidence: f64) -> Result<Self, StatsError> {
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(StatsError::InvalidParameter {
                name: "confidence",
                reason: format!("{confidence} is not inside (0, 1)"),
            });
        }
        StatsError::require(2, values.len())?;

        let n = values.len();
        let df = (n - 1) as f64;
        let alpha = 1.0 - confidence;

        let mean = descriptive::mean(values).unwrap_or(f64::NAN);
        let variance = descriptive::sample_variance(values).unwrap_or(f64::NAN);
        let std_dev = variance.sqrt();

        let t_crit = distribution::students_t_quantile(df, 1.0 - alpha / 2.0)?;
        let std_error = std_dev / (n as f64).sqrt();
        let mean_ci = ConfidenceInterval::around(mean, t_crit * std_error);

        let chi2_lower = distribution::chi_squared_quantile(df, alpha / 2.0)?;
        let chi2_upper = distribution::chi_squared_quantile(df, 1.0 - alpha / 2.0)?;
        let variance_ci =
            ConfidenceInterval::new(df * variance / chi2_upper, df * variance / chi2_lower);
        let std_dev_ci =
            ConfidenceInterval::new(variance_ci.lower.sqrt(), variance_ci.upper.sqrt());

        Ok(Self {
            count: n,
            confidence,
            mean,
            variance,
            std_dev,
            mean_ci,
            variance_ci,
            std_dev_ci,
        })
    }
}
