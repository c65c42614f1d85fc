//! Gaussian kernel density estimation.

use std::f64::consts::PI;

use crate::{descriptive, error::StatsError};

/// Univariate Gaussian kernel density estimate with Scott's rule bandwidth.
///
/// The bandwidth is `h = s * n^(-1/5)` where `s` is the sample standard
/// deviation, so `f(x) = 1/(n h) * sum phi((x - x_i) / h)`.
///
/// # Examples
///
/// ```
/// use pairstat_stats::kde::GaussianKde;
///
/// let kde = GaussianKde::new(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// let peak = kde.evaluate(3.0);
/// assert!(peak > kde.evaluate(1.0));
/// assert!(peak > kde.evaluate(5.0));
/// ```
#[derive(Debug, Clone)]
pub struct GaussianKde {
    points: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /// Fits the estimate; needs at least two finite values with nonzero spread.
    #[expect(clippy::cast_precision_loss)]
    pub fn new(values: &[f64]) -> Result<Self, StatsError> {
        let points = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        StatsError::require(2, points.len())?;

        let variance = descriptive::sample_variance(&points).unwrap_or(0.0);
        if variance <= 0.0 {
            return Err(StatsError::ZeroVariance);
        }
        let factor = (points.len() as f64).powf(-0.2);
        Ok(Self {
            bandwidth: variance.sqrt() * factor,
            points,
        })
    }

    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Density at `x`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        let norm = 1.0 / ((2.0 * PI).sqrt() * h * self.points.len() as f64);
        self.points
            .iter()
            .map(|p| {
                let z = (x - p) / h;
                (-0.5 * z * z).exp()
            })
            .sum::<f64>()
            * norm
    }

    /// Evaluates the density on `num_points` evenly spaced points of `[start, end]`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn evaluate_grid(&self, start: f64, end: f64, num_points: usize) -> Vec<(f64, f64)> {
        match num_points {
            0 => vec![],
            1 => vec![(start, self.evaluate(start))],
            _ => {
                let step = (end - start) / (num_points - 1) as f64;
                (0..num_points)
                    .map(|idx| {
                        let x = start + idx as f64 * step;
                        (x, self.evaluate(x))
                    })
                    .collect()
            }
        }
    }

    /// The data range padded by three bandwidths on each side.
    #[must_use]
    pub fn support(&self) -> (f64, f64) {
        let min = self.points.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self
            .points
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        (min - 3.0 * self.bandwidth, max + 3.0 * self.bandwidth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scott_bandwidth() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let kde = GaussianKde::new(&values).unwrap();
        let expected = (32.0_f64 / 7.0).sqrt() * 8.0_f64.powf(-0.2);
        assert!((kde.bandwidth() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_density_integrates_to_one() {
        let values = [0.3, 1.1, 1.9, 2.2, 2.4, 3.8, 4.0, 6.5];
        let kde = GaussianKde::new(&values).unwrap();
        let (start, end) = kde.support();
        let grid = kde.evaluate_grid(start - 5.0, end + 5.0, 4001);
        let step = grid[1].0 - grid[0].0;
        let area = grid.iter().map(|(_, y)| y * step).sum::<f64>();
        assert!((area - 1.0).abs() < 1e-3, "area = {area}");
    }

    #[test]
    fn test_rejects_degenerate_samples() {
        assert!(matches!(
            GaussianKde::new(&[1.0]),
            Err(StatsError::InsufficientData { needed: 2, actual: 1 })
        ));
        assert!(matches!(
            GaussianKde::new(&[2.0, 2.0, 2.0]),
            Err(StatsError::ZeroVariance)
        ));
    }
}
