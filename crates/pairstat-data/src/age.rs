//! Age-bucket labels such as `20-40`.

use std::{cmp::Ordering, fmt};

use serde::Serialize;

/// An age group as written in the input, e.g. `"40-60"` or `"40–60"`.
///
/// Buckets whose label parses as `lo-hi` order numerically by their bounds;
/// any other label sorts after them, alphabetically.
#[derive(Debug, Clone, Serialize)]
pub struct AgeBucket {
    label: String,
    #[serde(skip)]
    bounds: Option<(f64, f64)>,
}

impl AgeBucket {
    /// Creates a bucket from a trimmed, non-empty label.
    #[must_use]
    pub fn new(label: &str) -> Self {
        let label = label.trim().to_owned();
        let bounds = parse_bounds(&label);
        Self { label, bounds }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Lower and upper bound, when the label has the `lo-hi` form.
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.bounds
    }

    /// Label usable as a directory name: en dashes become `-`, spaces are removed.
    ///
    /// ```
    /// use pairstat_data::age::AgeBucket;
    ///
    /// assert_eq!(AgeBucket::new("20 – 40").file_name(), "20-40");
    /// ```
    #[must_use]
    pub fn file_name(&self) -> String {
        self.label.replace('\u{2013}', "-").replace(' ', "")
    }

    /// Whether two labels name the same bucket regardless of dash style and spacing.
    #[must_use]
    pub fn same_bucket(&self, other: &Self) -> bool {
        self.file_name() == other.file_name()
    }
}

fn parse_bounds(label: &str) -> Option<(f64, f64)> {
    let normalized = label.replace('\u{2013}', "-");
    let (lo, hi) = normalized.split_once('-')?;
    let lo = lo.trim().parse::<f64>().ok()?;
    let hi = hi.trim().parse::<f64>().ok()?;
    (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl PartialEq for AgeBucket {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AgeBucket {}

impl PartialOrd for AgeBucket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AgeBucket {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.bounds, other.bounds) {
            (Some((l1, h1)), Some((l2, h2))) => l1
                .total_cmp(&l2)
                .then(h1.total_cmp(&h2))
                .then_with(|| self.label.cmp(&other.label)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.label.cmp(&other.label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ordering() {
        let mut buckets = ["60-80", "0-10", "unknown", "20-40", "10-20", "5-10"]
            .map(AgeBucket::new)
            .to_vec();
        buckets.sort();
        let labels = buckets.iter().map(AgeBucket::label).collect::<Vec<_>>();
        assert_eq!(labels, ["0-10", "5-10", "10-20", "20-40", "60-80", "unknown"]);
    }

    #[test]
    fn test_en_dash_bounds() {
        let bucket = AgeBucket::new(" 40–60 ");
        assert_eq!(bucket.label(), "40–60");
        assert_eq!(bucket.bounds(), Some((40.0, 60.0)));
        assert_eq!(bucket.file_name(), "40-60");
        assert!(bucket.same_bucket(&AgeBucket::new("40-60")));
        assert_ne!(bucket, AgeBucket::new("40-60"));
    }

    #[test]
    fn test_unparsed_label_keeps_text() {
        let bucket = AgeBucket::new("adult");
        assert_eq!(bucket.bounds(), None);
        assert_eq!(bucket.to_string(), "adult");
    }
}
