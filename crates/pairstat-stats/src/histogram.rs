use std::ops::Range;

/// An equal-width histogram of a sample.
///
/// Bins cover `[min, max]` of the data. Each bin is closed on the left and
/// open on the right, except the last bin which also includes `max`.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// The bins, in ascending order.
    pub bins: Vec<HistogramBin>,
    /// Total number of values counted.
    pub total: u64,
}

/// A single bin in a histogram.
#[derive(Debug, Clone)]
pub struct HistogramBin {
    /// The range of values covered by this bin.
    pub range: Range<f64>,
    /// The number of values that fall within this bin.
    pub count: u64,
}

impl HistogramBin {
    /// The bin height normalized so that the histogram integrates to 1.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn density(&self, total: u64) -> f64 {
        let width = self.range.end - self.range.start;
        if total == 0 || width <= 0.0 {
            return 0.0;
        }
        self.count as f64 / (total as f64 * width)
    }
}

impl Histogram {
    /// Creates a histogram with `num_bins` equal-width bins.
    ///
    /// Non-finite values are ignored. When all values are equal the single
    /// value is centred in a range of width 1.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pairstat_stats::histogram::Histogram;
    /// let histogram = Histogram::new([1.0, 2.0, 2.5, 4.0], 3);
    /// let counts = histogram.bins.iter().map(|b| b.count).collect::<Vec<_>>();
    /// assert_eq!(counts, vec![1, 2, 1]);
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    #[must_use]
    pub fn new<I>(values: I, num_bins: usize) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let values = values
            .into_iter()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        if values.is_empty() || num_bins == 0 {
            return Self {
                bins: vec![],
                total: 0,
            };
        }

        let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max - min < f64::EPSILON {
            min -= 0.5;
            max += 0.5;
        }
        let width = (max - min) / num_bins as f64;

        let mut bins = (0..num_bins)
            .map(|idx| HistogramBin {
                // Recompute edges from `min` to avoid accumulating rounding error
                range: (min + idx as f64 * width)..(min + (idx + 1) as f64 * width),
                count: 0,
            })
            .collect::<Vec<_>>();

        for &value in &values {
            let idx = ((value - min) / width).floor() as usize;
            bins[idx.min(num_bins - 1)].count += 1;
        }

        Self {
            bins,
            total: values.len() as u64,
        }
    }

    /// The largest bin density, or `0.0` for an empty histogram.
    #[must_use]
    pub fn max_density(&self) -> f64 {
        self.bins
            .iter()
            .map(|bin| bin.density(self.total))
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_densities_integrate_to_one() {
        let values = (0..100).map(f64::from).collect::<Vec<_>>();
        let histogram = Histogram::new(values, 7);
        let area = histogram
            .bins
            .iter()
            .map(|bin| bin.density(histogram.total) * (bin.range.end - bin.range.start))
            .sum::<f64>();
        assert!((area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_lands_in_last_bin() {
        let histogram = Histogram::new([0.0, 10.0], 5);
        assert_eq!(histogram.bins[0].count, 1);
        assert_eq!(histogram.bins[4].count, 1);
    }

    #[test]
    fn test_constant_sample() {
        let histogram = Histogram::new([3.0, 3.0, 3.0], 4);
        assert_eq!(histogram.total, 3);
        assert_eq!(histogram.bins.iter().map(|b| b.count).sum::<u64>(), 3);
        assert!(histogram.bins[0].range.start < 3.0);
        assert!(histogram.bins[3].range.end > 3.0);
    }

    #[test]
    fn test_skips_non_finite_and_empty() {
        let histogram = Histogram::new([f64::NAN, f64::INFINITY], 4);
        assert!(histogram.bins.is_empty());
        assert_eq!(histogram.max_density(), 0.0);
    }
}
