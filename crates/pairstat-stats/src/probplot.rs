//! Normal probability (Q-Q) plot coordinates.

use serde::Serialize;

use crate::{distribution, error::StatsError};

/// Ordered sample against theoretical normal quantiles, with the
/// least-squares line through the points.
#[derive(Debug, Clone, Serialize)]
pub struct NormalProbabilityPlot {
    /// Theoretical quantiles of the standard normal distribution.
    pub theoretical: Vec<f64>,
    /// Sorted sample values.
    pub ordered: Vec<f64>,
    pub slope: f64,
    pub intercept: f64,
    /// Correlation of the two coordinate vectors.
    pub r: f64,
}

impl NormalProbabilityPlot {
    /// Computes the plot for the finite values of `values`.
    ///
    /// Theoretical positions are Filliben's estimates of the uniform order
    /// statistic medians mapped through the normal quantile function.
    pub fn new(values: &[f64]) -> Result<Self, StatsError> {
        let mut ordered = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        StatsError::require(2, ordered.len())?;
        ordered.sort_by(f64::total_cmp);

        let theoretical = filliben_medians(ordered.len())
            .into_iter()
            .map(distribution::normal_quantile)
            .collect::<Result<Vec<_>, _>>()?;

        let (slope, intercept, r) = least_squares(&theoretical, &ordered);
        Ok(Self {
            theoretical,
            ordered,
            slope,
            intercept,
            r,
        })
    }

    /// Value of the fitted line at theoretical quantile `z`.
    #[must_use]
    pub fn line_at(&self, z: f64) -> f64 {
        self.intercept + self.slope * z
    }
}

#[expect(clippy::cast_precision_loss)]
fn filliben_medians(n: usize) -> Vec<f64> {
    let nf = n as f64;
    let last = 0.5_f64.powf(1.0 / nf);
    (1..=n)
        .map(|i| {
            if i == 1 {
                1.0 - last
            } else if i == n {
                last
            } else {
                (i as f64 - 0.3175) / (nf + 0.365)
            }
        })
        .collect()
}

#[expect(clippy::cast_precision_loss)]
fn least_squares(x: &[f64], y: &[f64]) -> (f64, f64, f64) {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mean_x) * (b - mean_y);
        sxx += (a - mean_x) * (a - mean_x);
        syy += (b - mean_y) * (b - mean_y);
    }
    let slope = sxy / sxx;
    let r = if syy == 0.0 {
        0.0
    } else {
        sxy / (sxx * syy).sqrt()
    };
    (slope, mean_y - slope * mean_x, r)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_distr::{Distribution as _, Normal};
    use rand_pcg::Pcg64Mcg;

    use super::*;

    #[test]
    fn test_filliben_positions_are_symmetric() {
        let medians = filliben_medians(7);
        assert!((medians[3] - 0.5).abs() < 1e-12);
        for i in 0..7 {
            assert!((medians[i] + medians[6 - i] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_normal_sample_is_close_to_a_line() {
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        let normal = Normal::new(10.0, 2.0).unwrap();
        let values = (0..500).map(|_| normal.sample(&mut rng)).collect::<Vec<f64>>();
        let plot = NormalProbabilityPlot::new(&values).unwrap();
        assert!(plot.r > 0.99);
        assert!((plot.slope - 2.0).abs() < 0.2);
        assert!((plot.intercept - 10.0).abs() < 0.3);
        assert!(plot.ordered.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_constant_sample_has_flat_line() {
        let plot = NormalProbabilityPlot::new(&[3.0, 3.0, 3.0]).unwrap();
        assert_eq!(plot.slope, 0.0);
        assert_eq!(plot.line_at(1.0), 3.0);
        assert_eq!(plot.r, 0.0);
    }
}
