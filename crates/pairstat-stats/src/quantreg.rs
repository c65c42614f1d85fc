//! Linear quantile regression.
//!
//! Coefficients minimize the check loss `Σ ρ_q(y - Xβ)` with
//! `ρ_q(u) = u (q - 1{u < 0})`. The minimizer is found by iteratively
//! reweighted least squares. Standard errors come from a kernel sandwich
//! estimate, or from a row-resampling bootstrap driven by a seeded generator.

use nalgebra::{DMatrix, DVector};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg64Mcg;
use serde::Serialize;

use crate::{
    descriptive, distribution, error::StatsError, estimation::ConfidenceInterval, quantiles,
};

/// How coefficient standard errors are estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Covariance {
    /// Kernel sandwich `(XᵀX)⁻¹ XᵀDX (XᵀX)⁻¹` with an Epanechnikov kernel
    /// and the Hall-Sheather bandwidth.
    Robust,
    /// Standard deviation of the coefficients over `replicates` row resamples.
    Bootstrap { replicates: usize, seed: u64 },
}

/// Absolute residuals below this are raised to it before weighting.
const RESIDUAL_FLOOR: f64 = 1e-6;
const PINV_EPS: f64 = 1e-12;

/// Tuning of the estimator and its standard errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantRegOptions {
    pub max_iter: usize,
    /// Convergence threshold on the largest coefficient change.
    pub tolerance: f64,
    pub covariance: Covariance,
    /// Level of the coefficient intervals.
    pub confidence: f64,
}

impl Default for QuantRegOptions {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-6,
            covariance: Covariance::Robust,
            confidence: 0.95,
        }
    }
}

/// Coefficients of one IRLS run.
#[derive(Debug, Clone)]
pub struct IrlsSolution {
    pub params: DVector<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// One row of the coefficient table.
#[derive(Debug, Clone, Serialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
    pub ci: ConfidenceInterval,
}

/// Fitted model at one quantile.
#[derive(Debug, Clone, Serialize)]
pub struct QuantRegFit {
    pub quantile: f64,
    pub n_obs: usize,
    pub df_resid: usize,
    pub coefficients: Vec<Coefficient>,
    pub pseudo_r_squared: f64,
    pub iterations: usize,
    pub converged: bool,
    pub covariance: Covariance,
    /// Bootstrap replicates that produced a fit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_replicates: Option<usize>,
}

impl QuantRegFit {
    /// Linear predictor for one design row (intercept column included).
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(row)
            .map(|(c, x)| c.estimate * x)
            .sum()
    }
}

/// A design matrix with named columns and the response it explains.
#[derive(Debug, Clone)]
pub struct QuantileRegression {
    names: Vec<String>,
    x: DMatrix<f64>,
    y: DVector<f64>,
}

impl QuantileRegression {
    /// Checks that `names`, `x` and `y` agree in shape and that there are
    /// more rows than coefficients.
    pub fn new(names: Vec<String>, x: DMatrix<f64>, y: DVector<f64>) -> Result<Self, StatsError> {
        if names.len() != x.ncols() {
            return Err(StatsError::InvalidParameter {
                name: "names",
                reason: format!("{} names for {} columns", names.len(), x.ncols()),
            });
        }
        if y.len() != x.nrows() {
            return Err(StatsError::InvalidParameter {
                name: "y",
                reason: format!("{} responses for {} rows", y.len(), x.nrows()),
            });
        }
        StatsError::require(x.ncols() + 1, x.nrows())?;
        Ok(Self { names, x, y })
    }

    #[must_use]
    pub fn n_obs(&self) -> usize {
        self.x.nrows()
    }

    /// Fits the model at quantile `q` and estimates its standard errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use nalgebra::{DMatrix, DVector};
    /// use pairstat_stats::quantreg::{QuantRegOptions, QuantileRegression};
    ///
    /// let xs = (0..20).map(f64::from).collect::<Vec<_>>();
    /// let x = DMatrix::from_fn(20, 2, |i, j| if j == 0 { 1.0 } else { xs[i] });
    /// let y = DVector::from_iterator(20, xs.iter().map(|x| 1.0 + 0.5 * x));
    /// let model = QuantileRegression::new(vec!["Intercept".into(), "x".into()], x, y).unwrap();
    /// let fit = model.fit(0.5, &QuantRegOptions::default()).unwrap();
    /// assert!((fit.coefficients[1].estimate - 0.5).abs() < 1e-3);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn fit(&self, q: f64, options: &QuantRegOptions) -> Result<QuantRegFit, StatsError> {
        check_quantile(q)?;
        let solution = irls(&self.x, &self.y, q, options.max_iter, options.tolerance)?;
        let params = &solution.params;

        let (std_errors, bootstrap_replicates) = match options.covariance {
            Covariance::Robust => (robust_std_errors(&self.x, &self.y, params, q)?, None),
            Covariance::Bootstrap { replicates, seed } => {
                let draws = self.bootstrap(q, replicates, seed, options);
                let std_errors = (0..params.len())
                    .map(|j| {
                        let column = draws.iter().map(|b| b[j]).collect::<Vec<_>>();
                        descriptive::sample_variance(&column).map_or(f64::NAN, f64::sqrt)
                    })
                    .collect::<Vec<_>>();
                (std_errors, Some(draws.len()))
            }
        };

        let n = self.x.nrows();
        let df_resid = n - self.x.ncols();
        let df = df_resid as f64;
        let alpha = 1.0 - options.confidence;
        let t_crit = distribution::students_t_quantile(df, 1.0 - alpha / 2.0)?;

        let mut coefficients = Vec::with_capacity(params.len());
        for (j, name) in self.names.iter().enumerate() {
            let estimate = params[j];
            let std_error = std_errors[j];
            let t_value = estimate / std_error;
            let p_value = if t_value.is_finite() {
                distribution::students_t_two_sided(df, t_value)?
            } else {
                f64::NAN
            };
            coefficients.push(Coefficient {
                name: name.clone(),
                estimate,
                std_error,
                t_value,
                p_value,
                ci: ConfidenceInterval::around(estimate, t_crit * std_error),
            });
        }

        Ok(QuantRegFit {
            quantile: q,
            n_obs: n,
            df_resid,
            coefficients,
            pseudo_r_squared: pseudo_r_squared(&self.x, &self.y, params, q),
            iterations: solution.iterations,
            converged: solution.converged,
            covariance: options.covariance,
            bootstrap_replicates,
        })
    }

    /// Refits the model on `replicates` resamples of the rows.
    /// Replicates whose fit fails are left out.
    fn bootstrap(
        &self,
        q: f64,
        replicates: usize,
        seed: u64,
        options: &QuantRegOptions,
    ) -> Vec<DVector<f64>> {
        let n = self.x.nrows();
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        (0..replicates)
            .filter_map(|_| {
                let rows = (0..n).map(|_| rng.random_range(0..n)).collect::<Vec<_>>();
                let x = self.x.select_rows(&rows);
                let y = self.y.select_rows(&rows);
                irls(&x, &y, q, options.max_iter, options.tolerance)
                    .ok()
                    .map(|s| s.params)
            })
            .collect()
    }
}

fn check_quantile(q: f64) -> Result<(), StatsError> {
    if q > 0.0 && q < 1.0 {
        Ok(())
    } else {
        Err(StatsError::InvalidParameter {
            name: "quantile",
            reason: format!("{q} is not inside (0, 1)"),
        })
    }
}

/// Iteratively reweighted least squares for the check loss.
///
/// Starts from equal weights; each step solves the weighted normal equations
/// `(Xᵀ W X) β = Xᵀ W y` through a pseudo-inverse, with
/// `w_i = 1 / |ρ'_q(r_i)|` computed from the floored residuals.
pub fn irls(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    q: f64,
    max_iter: usize,
    tolerance: f64,
) -> Result<IrlsSolution, StatsError> {
    check_quantile(q)?;
    let (n, p) = x.shape();
    let mut weights = DVector::from_element(n, 1.0);
    let mut params = DVector::from_element(p, 1.0);

    for iteration in 1..=max_iter {
        let weighted = DMatrix::from_fn(n, p, |i, j| x[(i, j)] * weights[i]);
        let xtwx = weighted.transpose() * x;
        let xtwy = weighted.transpose() * y;
        let next = pseudo_inverse(xtwx)? * xtwy;

        let residuals = y - x * &next;
        weights = residuals.map(|r| {
            let r = if r.abs() < RESIDUAL_FLOOR {
                RESIDUAL_FLOOR.copysign(r)
            } else {
                r
            };
            let scaled = if r < 0.0 { q * r } else { (1.0 - q) * r };
            1.0 / scaled.abs()
        });

        let change = (&next - &params).amax();
        params = next;
        if change < tolerance {
            return Ok(IrlsSolution {
                params,
                iterations: iteration,
                converged: true,
            });
        }
    }

    Ok(IrlsSolution {
        params,
        iterations: max_iter,
        converged: false,
    })
}

fn pseudo_inverse(matrix: DMatrix<f64>) -> Result<DMatrix<f64>, StatsError> {
    matrix
        .pseudo_inverse(PINV_EPS)
        .map_err(|reason| StatsError::InvalidParameter {
            name: "design",
            reason: reason.to_owned(),
        })
}

/// Hall-Sheather bandwidth on the probability scale, for 95% intervals.
#[expect(clippy::cast_precision_loss)]
fn hall_sheather(n: usize, q: f64) -> Result<f64, StatsError> {
    let z = distribution::normal_quantile(q)?;
    let z_alpha = distribution::normal_quantile(0.975)?;
    let density = distribution::normal_pdf(z)?;
    let ratio = 1.5 * density * density / (2.0 * z * z + 1.0);
    Ok((n as f64).powf(-1.0 / 3.0) * z_alpha.powf(2.0 / 3.0) * ratio.cbrt())
}

fn epanechnikov(u: f64) -> f64 {
    if u.abs() <= 1.0 {
        0.75 * (1.0 - u * u)
    } else {
        0.0
    }
}

/// Standard errors from the sandwich `(XᵀX)⁻¹ XᵀDX (XᵀX)⁻¹`.
///
/// `D` holds `(q / f)²` for positive residuals and `((1 - q) / f)²`
/// otherwise, where `f` is the kernel density of the residuals at zero. Its
/// bandwidth is the Hall-Sheather width mapped through the normal quantiles
/// and scaled by `min(sd(y), iqr(residuals) / 1.34)`. All errors are NaN
/// when `q` is too close to 0 or 1 for the bandwidth, or when the density
/// estimate vanishes.
#[expect(clippy::cast_precision_loss)]
fn robust_std_errors(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    params: &DVector<f64>,
    q: f64,
) -> Result<Vec<f64>, StatsError> {
    let (n, p) = x.shape();
    let undefined = vec![f64::NAN; p];
    let bandwidth = hall_sheather(n, q)?;
    if q - bandwidth <= 0.0 || q + bandwidth >= 1.0 {
        return Ok(undefined);
    }

    let residuals = y - x * params;
    let mut sorted = residuals.iter().copied().collect::<Vec<_>>();
    sorted.sort_by(f64::total_cmp);
    let iqr =
        quantiles::quantile_sorted(&sorted, 0.75) - quantiles::quantile_sorted(&sorted, 0.25);
    let spread = y.variance().sqrt().min(iqr / 1.34);
    let h = spread
        * (distribution::normal_quantile(q + bandwidth)?
            - distribution::normal_quantile(q - bandwidth)?);
    let kernel_sum = residuals.iter().map(|e| epanechnikov(e / h)).sum::<f64>();
    let density = kernel_sum / (n as f64 * h);
    if !(density.is_finite() && density > 0.0) {
        return Ok(undefined);
    }

    let weights = residuals.map(|e| {
        let side = if e > 0.0 { q } else { 1.0 - q };
        (side / density).powi(2)
    });
    let weighted = DMatrix::from_fn(n, p, |i, j| x[(i, j)] * weights[i]);
    let xtx_inv = pseudo_inverse(x.transpose() * x)?;
    let vcov = &xtx_inv * (x.transpose() * weighted) * &xtx_inv;
    Ok(vcov.diagonal().iter().map(|v| v.sqrt()).collect())
}

/// Check loss `ρ_q(u)`.
#[must_use]
pub fn check_loss(u: f64, q: f64) -> f64 {
    if u < 0.0 { u * (q - 1.0) } else { u * q }
}

/// Koenker-Machado goodness of fit against the intercept-only model.
fn pseudo_r_squared(x: &DMatrix<f64>, y: &DVector<f64>, params: &DVector<f64>, q: f64) -> f64 {
    let fitted = x * params;
    let full = y
        .iter()
        .zip(fitted.iter())
        .map(|(yi, fi)| check_loss(yi - fi, q))
        .sum::<f64>();

    let mut sorted = y.iter().copied().collect::<Vec<_>>();
    sorted.sort_by(f64::total_cmp);
    let restricted_fit = quantiles::quantile_sorted(&sorted, q);
    let restricted = y
        .iter()
        .map(|yi| check_loss(yi - restricted_fit, q))
        .sum::<f64>();

    1.0 - full / restricted
}

#[cfg(test)]
mod tests {
    use rand_distr::{Distribution as _, Normal};

    use super::*;

    fn line_model(n: usize, noise: f64, seed: u64) -> QuantileRegression {
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        let normal = Normal::new(0.0, noise.max(f64::MIN_POSITIVE)).unwrap();
        let xs = (0..n).map(|i| i as f64 / 4.0).collect::<Vec<_>>();
        let x = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { xs[i] });
        let y = DVector::from_iterator(
            n,
            xs.iter().map(|x| {
                let e = if noise > 0.0 { normal.sample(&mut rng) } else { 0.0 };
                2.0 + 3.0 * x + e
            }),
        );
        QuantileRegression::new(vec!["Intercept".into(), "x".into()], x, y).unwrap()
    }

    #[test]
    fn test_exact_line_is_recovered() {
        let model = line_model(30, 0.0, 0);
        let fit = model.fit(0.5, &QuantRegOptions::default()).unwrap();
        assert!((fit.coefficients[0].estimate - 2.0).abs() < 1e-3);
        assert!((fit.coefficients[1].estimate - 3.0).abs() < 1e-3);
        assert!(fit.pseudo_r_squared > 0.999);
        assert!((fit.predict(&[1.0, 2.0]) - 8.0).abs() < 1e-2);
    }

    #[test]
    fn test_intercept_only_estimates_sample_median() {
        let x = DMatrix::from_element(5, 1, 1.0);
        let y = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 100.0]);
        let solution = irls(&x, &y, 0.5, 1000, 1e-6).unwrap();
        assert!((solution.params[0] - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_upper_quantile_lies_above_lower() {
        let model = line_model(200, 1.0, 3);
        let options = QuantRegOptions {
            covariance: Covariance::Bootstrap {
                replicates: 0,
                seed: 0,
            },
            ..QuantRegOptions::default()
        };
        let low = model.fit(0.25, &options).unwrap();
        let high = model.fit(0.75, &options).unwrap();
        assert!(high.predict(&[1.0, 10.0]) > low.predict(&[1.0, 10.0]));
        assert_eq!(low.bootstrap_replicates, Some(0));
        assert!(low.coefficients[0].std_error.is_nan());
    }

    #[test]
    fn test_robust_error_of_the_median() {
        // Intercept only: se = 0.5 / (sqrt(n) f) with f the kernel density
        // of y - 11 at zero, bandwidth 12.664
        let y = DVector::from_iterator(21, (1..=21).map(f64::from));
        let x = DMatrix::from_element(21, 1, 1.0);
        let model = QuantileRegression::new(vec!["Intercept".into()], x, y).unwrap();
        let fit = model.fit(0.5, &QuantRegOptions::default()).unwrap();
        assert_eq!(fit.covariance, Covariance::Robust);
        assert_eq!(fit.bootstrap_replicates, None);
        let coefficient = &fit.coefficients[0];
        assert!((coefficient.estimate - 11.0).abs() < 1e-3);
        assert!((coefficient.std_error - 2.388_404).abs() < 1e-4);
    }

    #[test]
    fn test_robust_errors_on_noisy_line() {
        let model = line_model(200, 1.0, 7);
        let fit = model.fit(0.75, &QuantRegOptions::default()).unwrap();
        for c in &fit.coefficients {
            assert!(c.std_error.is_finite() && c.std_error > 0.0);
            assert!(c.ci.contains(c.estimate));
        }
        assert!(fit.coefficients[1].std_error < 0.05);
        assert!(fit.coefficients[1].p_value < 1e-6);
    }

    #[test]
    fn test_bandwidth_too_wide_gives_undefined_errors() {
        // Hall-Sheather width for n = 8 at q = 0.05 exceeds q
        let x = DMatrix::from_fn(8, 2, |i, j| if j == 0 { 1.0 } else { i as f64 });
        let y = DVector::from_iterator(8, (0..8).map(|i| f64::from(i) * 0.5 + f64::from(i % 3)));
        let model = QuantileRegression::new(vec!["Intercept".into(), "x".into()], x, y).unwrap();
        let fit = model.fit(0.05, &QuantRegOptions::default()).unwrap();
        assert!(fit.coefficients.iter().all(|c| c.std_error.is_nan()));
    }

    #[test]
    fn test_bootstrap_is_reproducible_for_a_seed() {
        let model = line_model(60, 0.5, 11);
        let options = QuantRegOptions {
            covariance: Covariance::Bootstrap {
                replicates: 30,
                seed: 5,
            },
            ..QuantRegOptions::default()
        };
        let first = model.fit(0.5, &options).unwrap();
        let second = model.fit(0.5, &options).unwrap();
        assert_eq!(first.bootstrap_replicates, Some(30));
        for (a, b) in first.coefficients.iter().zip(&second.coefficients) {
            assert_eq!(a.std_error, b.std_error);
            assert!(a.std_error > 0.0);
            assert!(a.ci.contains(a.estimate));
            assert!((0.0..=1.0).contains(&a.p_value));
        }
        // Slope 3 with noise 0.5 is far from zero
        assert!(first.coefficients[1].p_value < 1e-6);
    }

    #[test]
    fn test_rejects_too_few_rows_and_bad_shapes() {
        let x = DMatrix::from_element(2, 2, 1.0);
        let y = DVector::from_vec(vec![1.0, 2.0]);
        assert!(matches!(
            QuantileRegression::new(vec!["a".into(), "b".into()], x.clone(), y.clone()),
            Err(StatsError::InsufficientData { needed: 3, actual: 2 })
        ));
        assert!(QuantileRegression::new(vec!["a".into()], x, y).is_err());
    }

    #[test]
    fn test_check_loss_is_asymmetric() {
        assert!((check_loss(2.0, 0.25) - 0.5).abs() < 1e-12);
        assert!((check_loss(-2.0, 0.25) - 1.5).abs() < 1e-12);
    }
}
