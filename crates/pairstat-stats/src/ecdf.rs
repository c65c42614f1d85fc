/// Empirical cumulative distribution function of a sample.
///
/// `F(x)` is the fraction of observations less than or equal to `x`, so the
/// function is right-continuous and steps up at every observation.
///
/// # Examples
///
/// ```
/// use pairstat_stats::ecdf::Ecdf;
///
/// let ecdf = Ecdf::new(&[3.0, 1.0, 2.0, 2.0]);
/// assert_eq!(ecdf.eval(0.5), 0.0);
/// assert_eq!(ecdf.eval(2.0), 0.75);
/// assert_eq!(ecdf.eval(3.0), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Ecdf {
    sorted: Vec<f64>,
}

impl Ecdf {
    /// Builds the ECDF of unsorted values. Non-finite values are dropped.
    #[must_use]
    pub fn new(values: &[f64]) -> Self {
        let mut sorted = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        Self { sorted }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// The observations, ascending.
    #[must_use]
    pub fn sorted_values(&self) -> &[f64] {
        &self.sorted
    }

    /// Evaluates `F(x)`; `0.0` for an empty sample.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn eval(&self, x: f64) -> f64 {
        if self.sorted.is_empty() {
            return 0.0;
        }
        let rank = self.sorted.partition_point(|v| *v <= x);
        rank as f64 / self.sorted.len() as f64
    }

    /// Step heights at each sorted observation: `(x_(i), i / n)`.
    ///
    /// Ties produce repeated x values with increasing heights, which draws
    /// correctly as a post-step line.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn steps(&self) -> Vec<(f64, f64)> {
        let n = self.sorted.len() as f64;
        self.sorted
            .iter()
            .enumerate()
            .map(|(idx, &x)| (x, (idx + 1) as f64 / n))
            .collect()
    }
}
