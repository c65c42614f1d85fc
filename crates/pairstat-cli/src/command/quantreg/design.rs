//! Design matrices with treatment-coded factors.

use nalgebra::{DMatrix, DVector};
use pairstat_data::{age::AgeBucket, column::Column, dataset::Dataset, observation::Observation};
use pairstat_stats::{error::StatsError, quantreg::QuantileRegression};

/// A level of a categorical column.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub(crate) enum Level {
    #[display("{_0}")]
    Sex(i64),
    #[display("{_0}")]
    Age(AgeBucket),
}

impl Level {
    fn of(row: &Observation, column: Column) -> Option<Self> {
        match column {
            Column::Sex => row.sex.map(Self::Sex),
            Column::Age => row.age.clone().map(Self::Age),
            _ => None,
        }
    }
}

/// Distinct levels of a categorical column, lowest first.
pub(crate) fn levels(data: &Dataset, column: Column) -> Vec<Level> {
    match column {
        Column::Sex => data.sexes().into_iter().map(Level::Sex).collect(),
        Column::Age => data.age_buckets().into_iter().map(Level::Age).collect(),
        _ => vec![],
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Term {
    Intercept,
    Numeric(Column),
    Indicator { column: Column, level: Level },
}

impl Term {
    fn name(&self) -> String {
        match self {
            Self::Intercept => "Intercept".to_owned(),
            Self::Numeric(column) => column.name().to_owned(),
            Self::Indicator { column, level } => format!("{column}[T.{level}]"),
        }
    }

    fn value(&self, row: &Observation) -> f64 {
        match self {
            Self::Intercept => 1.0,
            Self::Numeric(column) => row.numeric(*column).unwrap_or(f64::NAN),
            Self::Indicator { column, level } => {
                if Level::of(row, *column).as_ref() == Some(level) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Response vector and design matrix of `dependent ~ covariates`.
///
/// The first column is the intercept. Numeric covariates follow as-is;
/// a categorical covariate with `k` levels adds `k - 1` indicator columns,
/// the lowest level being the reference.
#[derive(Debug, Clone)]
pub(crate) struct Design {
    pub names: Vec<String>,
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
}

impl Design {
    /// Builds the design from the rows where the dependent and every
    /// covariate are present.
    pub(crate) fn new(data: &Dataset, dependent: Column, covariates: &[Column]) -> Self {
        let mut required = vec![dependent];
        required.extend_from_slice(covariates);
        let data = data.complete_for(&required);

        let mut terms = vec![Term::Intercept];
        for &column in covariates {
            if column.is_categorical() {
                terms.extend(
                    levels(&data, column)
                        .into_iter()
                        .skip(1)
                        .map(|level| Term::Indicator { column, level }),
                );
            } else {
                terms.push(Term::Numeric(column));
            }
        }

        let rows = data.rows();
        let x = DMatrix::from_fn(rows.len(), terms.len(), |i, j| terms[j].value(&rows[i]));
        let y = DVector::from_iterator(
            rows.len(),
            rows.iter()
                .map(|r| r.numeric(dependent).unwrap_or(f64::NAN)),
        );
        Self {
            names: terms.iter().map(Term::name).collect(),
            x,
            y,
        }
    }

    pub(crate) fn n_obs(&self) -> usize {
        self.x.nrows()
    }

    pub(crate) fn into_model(self) -> Result<QuantileRegression, StatsError> {
        QuantileRegression::new(self.names, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let csv = "A,poměr,pohlaví,věk\n\
                   2.0,1.5,2,20-40\n\
                   2.1,1.6,1,0-10\n\
                   2.2,,1,10-20\n\
                   2.3,1.7,2,10-20\n\
                   ,1.8,1,20-40\n";
        Dataset::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_treatment_coding() {
        let design = Design::new(&dataset(), Column::Ratio, &[Column::Sex, Column::Age]);
        assert_eq!(
            design.names,
            ["Intercept", "sex[T.2]", "age[T.10-20]", "age[T.20-40]"]
        );
        assert_eq!(design.n_obs(), 4);
        assert_eq!(design.y.as_slice(), [1.5, 1.6, 1.7, 1.8]);
        let rows = (0..4)
            .map(|i| design.x.row(i).iter().copied().collect::<Vec<_>>())
            .collect::<Vec<_>>();
        assert_eq!(rows[0], [1.0, 1.0, 0.0, 1.0]);
        assert_eq!(rows[1], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(rows[2], [1.0, 1.0, 1.0, 0.0]);
        assert_eq!(rows[3], [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_numeric_covariate_drops_incomplete_rows() {
        let design = Design::new(&dataset(), Column::Ratio, &[Column::A]);
        assert_eq!(design.names, ["Intercept", "A"]);
        assert_eq!(design.n_obs(), 3);
        let a = design.x.column(1).iter().copied().collect::<Vec<_>>();
        assert_eq!(a, [2.0, 2.1, 2.3]);
    }

    #[test]
    fn test_too_few_rows_for_model() {
        let design = Design::new(&dataset(), Column::Ratio, &[Column::Sex, Column::Age]);
        assert!(matches!(
            design.into_model(),
            Err(StatsError::InsufficientData { needed: 5, actual: 4 })
        ));
    }
}
