//! Two-sample Mann-Whitney U test (Wilcoxon rank-sum test).

use serde::Serialize;

use crate::{distribution, error::StatsError, ks::PValueMethod};

/// The exact null distribution is used when the smaller sample has at most
/// this many values.
const EXACT_MAX_SIZE: usize = 8;

/// Result of a two-sided Mann-Whitney U test.
///
/// `u_statistic` is `U1`, the statistic of the first sample:
/// `R1 - n1 (n1 + 1) / 2` with mid-ranks for ties.
#[derive(Debug, Clone, Serialize)]
pub struct MannWhitneyTest {
    pub n1: usize,
    pub n2: usize,
    pub u_statistic: f64,
    pub p_value: f64,
    pub method: PValueMethod,
}

impl MannWhitneyTest {
    /// Runs the test; non-finite values are dropped.
    ///
    /// The exact distribution is used when either sample has at most 8
    /// values and there are no ties. Otherwise the normal approximation with
    /// tie and continuity corrections is used; it gives `p = 1` when every
    /// pooled value is tied.
    ///
    /// # Examples
    ///
    /// ```
    /// use pairstat_stats::mann_whitney::MannWhitneyTest;
    ///
    /// let test = MannWhitneyTest::new(&[1.0, 2.0, 3.0, 4.0, 5.0], &[6.0, 7.0, 8.0, 9.0, 10.0]).unwrap();
    /// assert_eq!(test.u_statistic, 0.0);
    /// assert!((test.p_value - 2.0 / 252.0).abs() < 1e-12);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn new(sample1: &[f64], sample2: &[f64]) -> Result<Self, StatsError> {
        let x = finite(sample1);
        let y = finite(sample2);
        StatsError::require(1, x.len())?;
        StatsError::require(1, y.len())?;

        let (n1, n2) = (x.len(), y.len());
        let pooled = x.iter().chain(&y).copied().collect::<Vec<_>>();
        let (ranks, tie_term) = midranks(&pooled);

        let r1 = ranks[..n1].iter().sum::<f64>();
        let u1 = r1 - (n1 * (n1 + 1)) as f64 / 2.0;
        let u2 = (n1 * n2) as f64 - u1;
        let u = u1.max(u2);

        let (p_value, method) = if n1.min(n2) <= EXACT_MAX_SIZE && tie_term == 0.0 {
            (2.0 * exact_sf(n1, n2, u), PValueMethod::Exact)
        } else {
            (
                asymptotic_p_value(n1, n2, u, tie_term)?,
                PValueMethod::Asymptotic,
            )
        };

        Ok(Self {
            n1,
            n2,
            u_statistic: u1,
            p_value: p_value.clamp(0.0, 1.0),
            method,
        })
    }

    /// Whether the null hypothesis of equal location is rejected at `alpha`.
    #[must_use]
    pub fn rejects(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Mid-ranks (1-based) of `values` and the tie term `sum(t^3 - t)` over tie groups.
#[expect(clippy::cast_precision_loss)]
fn midranks(values: &[f64]) -> (Vec<f64>, f64) {
    let mut order = (0..values.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end) as f64 / 2.0 + 1.0;
        for &idx in &order[start..=end] {
            ranks[idx] = rank;
        }
        let t = (end - start + 1) as f64;
        tie_term += t * t * t - t;
        start = end + 1;
    }
    (ranks, tie_term)
}

#[expect(clippy::cast_precision_loss)]
fn asymptotic_p_value(n1: usize, n2: usize, u: f64, tie_term: f64) -> Result<f64, StatsError> {
    let n = (n1 + n2) as f64;
    let mu = (n1 * n2) as f64 / 2.0;
    let variance = (n1 * n2) as f64 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if variance <= 0.0 || !variance.is_finite() {
        return Ok(1.0);
    }
    let z = (u - mu - 0.5) / variance.sqrt();
    Ok(2.0 * distribution::normal_sf(z)?)
}

/// Number of orderings with `U = k` for `k` in `0..=n1 * n2`.
///
/// These are the coefficients of the Gaussian binomial
/// `[n1 + n2, m]_q = prod_{i=1..m} (1 - q^(n + i)) / (1 - q^i)` with
/// `m <= n` the two sample sizes, built one factor at a time in a single
/// array of length `m n + 1`.
fn u_frequencies(n1: usize, n2: usize) -> Vec<f64> {
    let (m, n) = (n1.min(n2), n1.max(n2));
    let max_u = m * n;
    let mut freqs = vec![0.0; max_u + 1];
    freqs[0] = 1.0;
    for i in 1..=m {
        for k in i..=max_u {
            freqs[k] += freqs[k - i];
        }
        for k in (n + i..=max_u).rev() {
            freqs[k] -= freqs[k - n - i];
        }
    }
    freqs
}

/// `P(U >= u)` under the null, from the exact distribution of `U`.
///
/// The distribution is symmetric about `n1 n2 / 2`, so the upper tail is
/// summed as the lower tail `P(U <= n1 n2 - u)`, where the counts are small.
#[expect(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn exact_sf(n1: usize, n2: usize, u: f64) -> f64 {
    let freqs = u_frequencies(n1, n2);
    let max_u = freqs.len() - 1;
    let threshold = u.ceil().max(0.0) as usize;
    if threshold > max_u {
        return 0.0;
    }
    let total = freqs.iter().sum::<f64>();
    freqs[..=max_u - threshold].iter().sum::<f64>() / total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midranks_average_ties() {
        let (ranks, tie_term) = midranks(&[10.0, 20.0, 20.0, 30.0]);
        assert_eq!(ranks, vec![1.0, 2.5, 2.5, 4.0]);
        assert_eq!(tie_term, 6.0);
    }

    #[test]
    fn test_exact_distribution_is_symmetric() {
        // U for (3, 4) ranges over 0..=12 with mean 6
        let low = exact_sf(3, 4, 0.0);
        assert!((low - 1.0).abs() < 1e-12);
        let upper_tail = exact_sf(3, 4, 10.0);
        let lower_tail = 1.0 - exact_sf(3, 4, 3.0);
        assert!((upper_tail - lower_tail).abs() < 1e-12);
    }

    #[test]
    fn test_u_frequencies() {
        // U for (2, 3): 10 orderings with counts 1, 1, 2, 2, 2, 1, 1
        assert_eq!(u_frequencies(2, 3), [1.0, 1.0, 2.0, 2.0, 2.0, 1.0, 1.0]);
        assert_eq!(u_frequencies(3, 2), u_frequencies(2, 3));
        let total = u_frequencies(8, 8).iter().sum::<f64>();
        assert_eq!(total, 12_870.0);
    }

    #[test]
    fn test_exact_with_one_small_sample() {
        let small = (1..=5).map(f64::from).collect::<Vec<_>>();
        let large = (6..=25).map(f64::from).collect::<Vec<_>>();
        let test = MannWhitneyTest::new(&small, &large).unwrap();
        assert!(test.method.is_exact());
        assert_eq!(test.u_statistic, 0.0);
        // 2 / C(25, 5)
        assert!((test.p_value - 3.764_352e-5).abs() < 1e-10);
    }

    #[test]
    fn test_exact_at_eight_values_each() {
        let a = (1..=8).map(f64::from).collect::<Vec<_>>();
        let b = (9..=16).map(f64::from).collect::<Vec<_>>();
        let test = MannWhitneyTest::new(&a, &b).unwrap();
        assert!(test.method.is_exact());
        assert!((test.p_value - 2.0 / 12_870.0).abs() < 1e-12);
    }

    #[test]
    fn test_asymptotic_above_eight_values_each() {
        let a = (1..=9).map(f64::from).collect::<Vec<_>>();
        let b = (10..=18).map(f64::from).collect::<Vec<_>>();
        let test = MannWhitneyTest::new(&a, &b).unwrap();
        assert!(test.method.is_asymptotic());
        assert!(test.rejects(0.001));
    }

    #[test]
    fn test_all_values_tied() {
        let test = MannWhitneyTest::new(&[3.0; 5], &[3.0; 4]).unwrap();
        assert!(test.method.is_asymptotic());
        assert_eq!(test.u_statistic, 10.0);
        assert_eq!(test.p_value, 1.0);
        assert!(!test.rejects(0.05));
    }

    #[test]
    fn test_asymptotic_with_ties() {
        let a = [1.0, 2.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let b = [5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let test = MannWhitneyTest::new(&a, &b).unwrap();
        assert!(test.method.is_asymptotic());
        assert_eq!(test.u_statistic, 8.0);
        // z = (64 - 36 - 0.5) / sqrt(72 / 12 * (18 - 30 / 272))
        assert!((test.p_value - 0.007_946_527).abs() < 1e-6);
        assert!(test.rejects(0.05));
    }

    #[test]
    fn test_swapping_samples_keeps_p_value() {
        let a = [0.9, 1.7, 2.8, 3.1, 4.6, 5.2];
        let b = [1.2, 2.0, 2.5, 3.9, 6.3];
        let ab = MannWhitneyTest::new(&a, &b).unwrap();
        let ba = MannWhitneyTest::new(&b, &a).unwrap();
        assert!((ab.p_value - ba.p_value).abs() < 1e-12);
        assert!((ab.u_statistic + ba.u_statistic - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_identical_samples_do_not_reject() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let test = MannWhitneyTest::new(&values, &values).unwrap();
        assert!((test.p_value - 1.0).abs() < 1e-12);
    }
}
