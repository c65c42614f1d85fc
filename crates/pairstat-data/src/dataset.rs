//! The in-memory measurement table.

use std::{collections::BTreeSet, fs::File, io, path::Path};

use crate::{age::AgeBucket, column::Column, error::DataError, observation::Observation};

/// Rows of a measurement file together with the set of columns it had.
///
/// # Examples
///
/// ```
/// use pairstat_data::{column::Column, dataset::Dataset};
///
/// let csv = "datetime,A,B,poměr\n2024-01-01 10:00:00,3.0,2.0,1.5\n2024-01-02 10:00:00,x,2.0,\n";
/// let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
/// assert_eq!(dataset.len(), 2);
/// assert!(dataset.has_column(Column::Ratio));
/// assert!(!dataset.has_column(Column::Sex));
/// assert_eq!(dataset.values(Column::A), vec![3.0]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: BTreeSet<Column>,
    rows: Vec<Observation>,
}

impl Dataset {
    pub fn from_path<P>(path: P) -> Result<Self, DataError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        Self::from_reader(io::BufReader::new(file))
    }

    /// Reads a CSV with a header row.
    ///
    /// Unknown headers are ignored. When two headers map to the same column
    /// the first one wins. Rows may be shorter than the header.
    pub fn from_reader<R>(reader: R) -> Result<Self, DataError>
    where
        R: io::Read,
    {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let mut columns = BTreeSet::new();
        let mut mapping = Vec::new();
        for (index, header) in reader.headers()?.iter().enumerate() {
            if let Some(column) = Column::from_header(header)
                && columns.insert(column)
            {
                mapping.push((index, column));
            }
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut obs = Observation::default();
            for &(index, column) in &mapping {
                if let Some(cell) = record.get(index) {
                    obs.set_cell(column, cell);
                }
            }
            rows.push(obs);
        }

        Ok(Self { columns, rows })
    }

    #[must_use]
    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn require_column(&self, column: Column) -> Result<(), DataError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(DataError::MissingColumn { column })
        }
    }

    /// Present columns in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.columns.iter().copied()
    }

    /// Non-missing values of a numeric column, in row order.
    #[must_use]
    pub fn values(&self, column: Column) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.numeric(column)).collect()
    }

    /// One value per row, NaN where missing.
    #[must_use]
    pub fn values_or_nan(&self, column: Column) -> Vec<f64> {
        self.rows
            .iter()
            .map(|r| r.numeric(column).unwrap_or(f64::NAN))
            .collect()
    }

    /// Distinct sex codes, ascending.
    #[must_use]
    pub fn sexes(&self) -> Vec<i64> {
        self.rows
            .iter()
            .filter_map(|r| r.sex)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct age buckets, ascending.
    #[must_use]
    pub fn age_buckets(&self) -> Vec<AgeBucket> {
        self.rows
            .iter()
            .filter_map(|r| r.age.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sub-table of the rows matching `predicate`, with the same columns.
    #[must_use]
    pub fn filter<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&Observation) -> bool,
    {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }

    /// Rows where every listed column holds a value.
    #[must_use]
    pub fn complete_for(&self, columns: &[Column]) -> Self {
        self.filter(|r| columns.iter().all(|&c| r.has(c)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    /// First `n` rows.
    #[must_use]
    pub fn preview(&self, n: usize) -> &[Observation] {
        &self.rows[..n.min(self.rows.len())]
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    const SAMPLE: &str = "\
datetime,A,B,poměr,odchylka,pohlaví,věk
2024-01-01 08:00:00,3.2,2.0,1.6,2.5%,1,0-10
2024-01-01 09:00:00,3.0,2.0,1.5,,2,20-40
bad,,2.1,abc,1.0,1.5,20–40
2024-01-02 08:00:00,3.4,2.1,1.62,-1.0,1,
";

    fn sample() -> Dataset {
        Dataset::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_coercion() {
        let dataset = sample();
        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.values(Column::Ratio), vec![1.6, 1.5, 1.62]);
        assert_eq!(dataset.values(Column::Deviation), vec![2.5, 1.0, -1.0]);
        assert!(dataset.rows()[2].datetime.is_none());
        assert!(dataset.rows()[2].sex.is_none());
        assert!(dataset.rows()[3].age.is_none());
        assert!(dataset.values_or_nan(Column::A)[2].is_nan());
    }

    #[test]
    fn test_groups_are_sorted_and_distinct() {
        let dataset = sample();
        assert_eq!(dataset.sexes(), vec![1, 2]);
        let labels = dataset
            .age_buckets()
            .iter()
            .map(|b| b.label().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(labels, ["0-10", "20-40", "20–40"]);
    }

    #[test]
    fn test_filter_keeps_columns() {
        let dataset = sample();
        let complete = dataset.complete_for(&[Column::Datetime, Column::A, Column::B]);
        assert_eq!(complete.len(), 3);
        assert!(complete.has_column(Column::Age));
        assert_eq!(dataset.filter(|r| r.sex == Some(1)).len(), 2);
        assert_eq!(dataset.preview(10).len(), 4);
        assert_eq!(dataset.preview(1).len(), 1);
    }

    #[test]
    fn test_missing_column() {
        let dataset = Dataset::from_reader("A,b\n1,2\n".as_bytes()).unwrap();
        assert!(dataset.has_column(Column::B));
        assert!(matches!(
            dataset.require_column(Column::Ratio),
            Err(DataError::MissingColumn {
                column: Column::Ratio
            })
        ));
        assert!(dataset.values(Column::Ratio).is_empty());
    }

    #[test]
    fn test_short_rows_and_files() {
        let dataset = Dataset::from_reader("A,B,poměr\n1,2\n".as_bytes()).unwrap();
        assert_eq!(dataset.rows()[0].b, Some(2.0));
        assert_eq!(dataset.rows()[0].ratio, None);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        assert_eq!(Dataset::from_path(file.path()).unwrap().len(), 4);
        assert!(matches!(
            Dataset::from_path(file.path().with_extension("missing")),
            Err(DataError::Io(_))
        ));
    }
}
