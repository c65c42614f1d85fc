//! Two-sample Kolmogorov-Smirnov test.
//!
//! The statistic is `D = max_x |F1(x) - F2(x)|` over the pooled sample, where
//! `F1` and `F2` are the right-continuous ECDFs of the two samples. Besides
//! `D` and its p-value the result records where the maximum is attained, so
//! callers can mark it on an ECDF plot.

use serde::Serialize;

use crate::{ecdf::Ecdf, error::StatsError};

/// Above this size of the larger sample the asymptotic distribution replaces
/// the exact one.
const EXACT_LIMIT: usize = 10_000;

/// How the p-value was obtained.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display, derive_more::IsVariant,
)]
#[serde(rename_all = "lowercase")]
pub enum PValueMethod {
    #[display("exact")]
    Exact,
    #[display("asymptotic")]
    Asymptotic,
}

/// Point where the ECDF distance is largest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatisticLocation {
    /// The pooled sample value where `|F1 - F2|` is maximal (first one, ascending).
    pub x: f64,
    /// `F1(x)`.
    pub ecdf1: f64,
    /// `F2(x)`.
    pub ecdf2: f64,
}

/// Result of a two-sided two-sample KS test.
#[derive(Debug, Clone, Serialize)]
pub struct KsTest {
    pub n1: usize,
    pub n2: usize,
    pub statistic: f64,
    pub p_value: f64,
    pub method: PValueMethod,
    pub location: StatisticLocation,
}

impl KsTest {
    /// Runs the test on two samples; non-finite values are dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use pairstat_stats::ks::KsTest;
    ///
    /// let test = KsTest::new(&[1.0, 2.0, 3.0, 4.0, 5.0], &[6.0, 7.0, 8.0, 9.0, 10.0]).unwrap();
    /// assert_eq!(test.statistic, 1.0);
    /// // Only 2 of the C(10, 5) = 252 orderings separate the samples completely
    /// assert!((test.p_value - 2.0 / 252.0).abs() < 1e-12);
    /// ```
    pub fn new(sample1: &[f64], sample2: &[f64]) -> Result<Self, StatsError> {
        let ecdf1 = Ecdf::new(sample1);
        let ecdf2 = Ecdf::new(sample2);
        StatsError::require(1, ecdf1.len())?;
        StatsError::require(1, ecdf2.len())?;

        let location = max_distance(&ecdf1, &ecdf2);
        let statistic = (location.ecdf1 - location.ecdf2).abs();

        let (n1, n2) = (ecdf1.len(), ecdf2.len());
        let (p_value, method) = if n1.max(n2) <= EXACT_LIMIT {
            (exact_p_value(n1, n2, statistic), PValueMethod::Exact)
        } else {
            (asymptotic_p_value(n1, n2, statistic), PValueMethod::Asymptotic)
        };

        Ok(Self {
            n1,
            n2,
            statistic,
            p_value: p_value.clamp(0.0, 1.0),
            method,
            location,
        })
    }

    /// Whether the null hypothesis of equal distributions is rejected at `alpha`.
    #[must_use]
    pub fn rejects(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

fn max_distance(ecdf1: &Ecdf, ecdf2: &Ecdf) -> StatisticLocation {
    let mut pooled = ecdf1
        .sorted_values()
        .iter()
        .chain(ecdf2.sorted_values())
        .copied()
        .collect::<Vec<_>>();
    pooled.sort_by(f64::total_cmp);

    let mut best = StatisticLocation {
        x: pooled[0],
        ecdf1: ecdf1.eval(pooled[0]),
        ecdf2: ecdf2.eval(pooled[0]),
    };
    for &x in &pooled[1..] {
        let (f1, f2) = (ecdf1.eval(x), ecdf2.eval(x));
        if (f1 - f2).abs() > (best.ecdf1 - best.ecdf2).abs() {
            best = StatisticLocation {
                x,
                ecdf1: f1,
                ecdf2: f2,
            };
        }
    }
    best
}

/// `P(D >= d)` under the null by counting monotone lattice paths that stay
/// strictly inside the band `|i/m - j/n| < d`.
///
/// The path count is kept normalized by `C(m + n, n)` while it is built, so
/// the recursion never overflows.
#[expect(clippy::cast_precision_loss)]
fn exact_p_value(n1: usize, n2: usize, statistic: f64) -> f64 {
    let (m, n) = if n1 <= n2 { (n1, n2) } else { (n2, n1) };
    let (md, nd) = (m as f64, n as f64);
    // Shrink d onto the lattice of attainable values to absorb rounding
    let q = (0.5 + (statistic * md * nd - 1e-7).floor()) / (md * nd);

    let mut u = (0..=n)
        .map(|j| if j as f64 / nd > q { 0.0 } else { 1.0 })
        .collect::<Vec<f64>>();
    for i in 1..=m {
        let w = i as f64 / (i + n) as f64;
        u[0] = if i as f64 / md > q { 0.0 } else { w * u[0] };
        for j in 1..=n {
            u[j] = if (i as f64 / md - j as f64 / nd).abs() > q {
                0.0
            } else {
                w * u[j] + u[j - 1]
            };
        }
    }
    1.0 - u[n]
}

/// Kolmogorov distribution tail at `sqrt(n1 n2 / (n1 + n2)) * d`.
#[expect(clippy::cast_precision_loss)]
fn asymptotic_p_value(n1: usize, n2: usize, statistic: f64) -> f64 {
    let en = (n1 as f64 * n2 as f64) / (n1 + n2) as f64;
    kolmogorov_sf(en.sqrt() * statistic)
}

/// `Q(λ) = 2 Σ_{k≥1} (-1)^(k-1) exp(-2 k² λ²)`.
fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    let mut sum = 0.0;
    let mut sign = 1.0;
    for k in 1..=100_u32 {
        let k = f64::from(k);
        let term = (-2.0 * k * k * lambda * lambda).exp();
        sum += sign * term;
        if term < 1e-16 {
            break;
        }
        sign = -sign;
    }
    (2.0 * sum).clamp(0.0, 1.0)
}
