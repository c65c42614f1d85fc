use serde::Serialize;

use crate::quantiles::{median_sorted, quantile_sorted};

/// Tukey fences derived from the interquartile range.
///
/// A value is an outlier when it lies strictly outside
/// `[q1 - 1.5 * iqr, q3 + 1.5 * iqr]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IqrFences {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrFences {
    const WHISKER: f64 = 1.5;

    /// Computes the fences from unsorted values; `None` when empty.
    #[must_use]
    pub fn new(values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted)
    }

    /// Computes the fences from sorted values; `None` when empty.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        if sorted_values.is_empty() {
            return None;
        }
        let q1 = quantile_sorted(sorted_values, 0.25);
        let q3 = quantile_sorted(sorted_values, 0.75);
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            lower: q1 - Self::WHISKER * iqr,
            upper: q3 + Self::WHISKER * iqr,
        })
    }

    #[must_use]
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

/// Everything needed to draw one box of a box plot.
///
/// Whiskers end at the most extreme observations still inside the fences.
#[derive(Debug, Clone, Serialize)]
pub struct BoxSummary {
    pub median: f64,
    pub fences: IqrFences,
    pub whisker_low: f64,
    pub whisker_high: f64,
    /// Observations outside the fences, ascending.
    pub fliers: Vec<f64>,
}

impl BoxSummary {
    /// Summarizes unsorted values; `None` when empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use pairstat_stats::summary::BoxSummary;
    ///
    /// let summary = BoxSummary::new(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
    /// assert_eq!(summary.median, 3.0);
    /// assert_eq!(summary.whisker_high, 4.0);
    /// assert_eq!(summary.fliers, vec![100.0]);
    /// ```
    #[must_use]
    pub fn new(values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let fences = IqrFences::from_sorted(&sorted)?;

        let (inside, fliers): (Vec<f64>, Vec<f64>) =
            sorted.iter().partition(|v| !fences.is_outlier(**v));
        let whisker_low = inside.first().copied().unwrap_or(fences.q1);
        let whisker_high = inside.last().copied().unwrap_or(fences.q3);

        Some(Self {
            median: median_sorted(&sorted),
            fences,
            whisker_low,
            whisker_high,
            fliers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fences_on_uniform_grid() {
        let values = (1..=9).map(f64::from).collect::<Vec<_>>();
        let fences = IqrFences::new(&values).unwrap();
        assert_eq!(fences.q1, 3.0);
        assert_eq!(fences.q3, 7.0);
        assert_eq!(fences.lower, -3.0);
        assert_eq!(fences.upper, 13.0);
        assert!(!fences.is_outlier(13.0));
        assert!(fences.is_outlier(13.5));
    }

    #[test]
    fn test_low_and_high_fliers() {
        let summary = BoxSummary::new(&[-50.0, 10.0, 11.0, 12.0, 13.0, 14.0, 80.0]).unwrap();
        assert_eq!(summary.fliers, vec![-50.0, 80.0]);
        assert_eq!(summary.whisker_low, 10.0);
        assert_eq!(summary.whisker_high, 14.0);
    }

    #[test]
    fn test_empty_is_none() {
        assert!(IqrFences::new(&[]).is_none());
        assert!(BoxSummary::new(&[]).is_none());
    }
}
