//! Children and adults cohorts defined by age buckets.

use serde::Serialize;

use crate::{age::AgeBucket, column::Column, dataset::Dataset};

/// Age buckets forming the two compared cohorts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cohorts {
    pub children: Vec<AgeBucket>,
    pub adults: Vec<AgeBucket>,
}

impl Default for Cohorts {
    fn default() -> Self {
        Self {
            children: parse_bucket_list("0-10,10-20"),
            adults: parse_bucket_list("20-40,40-60,60-80"),
        }
    }
}

/// Values of one column split by cohort, in row order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CohortSplit {
    pub children: Vec<f64>,
    pub adults: Vec<f64>,
}

impl Cohorts {
    #[must_use]
    pub fn new(children: Vec<AgeBucket>, adults: Vec<AgeBucket>) -> Self {
        Self { children, adults }
    }

    #[must_use]
    pub fn is_child(&self, bucket: &AgeBucket) -> bool {
        self.children.iter().any(|b| b.same_bucket(bucket))
    }

    #[must_use]
    pub fn is_adult(&self, bucket: &AgeBucket) -> bool {
        self.adults.iter().any(|b| b.same_bucket(bucket))
    }

    /// Non-missing values of `column` for the rows of each cohort.
    ///
    /// Rows without an age bucket, or with a bucket in neither list, are
    /// left out.
    ///
    /// ```
    /// use pairstat_data::{cohort::Cohorts, column::Column, dataset::Dataset};
    ///
    /// let csv = "poměr,věk\n1.4,0-10\n1.6,40-60\n1.5,10–20\n,60-80\n1.7,90-100\n";
    /// let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
    /// let split = Cohorts::default().split(&dataset, Column::Ratio);
    /// assert_eq!(split.children, vec![1.4, 1.5]);
    /// assert_eq!(split.adults, vec![1.6]);
    /// ```
    #[must_use]
    pub fn split(&self, dataset: &Dataset, column: Column) -> CohortSplit {
        let mut split = CohortSplit::default();
        for row in dataset.rows() {
            let (Some(age), Some(value)) = (&row.age, row.numeric(column)) else {
                continue;
            };
            if self.is_child(age) {
                split.children.push(value);
            } else if self.is_adult(age) {
                split.adults.push(value);
            }
        }
        split
    }
}

/// Parses a comma-separated list of bucket labels, skipping empty items.
#[must_use]
pub fn parse_bucket_list(list: &str) -> Vec<AgeBucket> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(AgeBucket::new)
        .collect()
}
