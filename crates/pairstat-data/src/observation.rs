//! One row of the measurement table and the coercion of its cells.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::{age::AgeBucket, column::Column};

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

/// A measurement row. Cells that were absent or failed to parse are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Observation {
    pub datetime: Option<NaiveDateTime>,
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub ratio: Option<f64>,
    /// Percent deviation, without the `%` sign.
    pub deviation: Option<f64>,
    pub sex: Option<i64>,
    pub age: Option<AgeBucket>,
}

impl Observation {
    /// Stores the coerced value of one raw cell.
    pub fn set_cell(&mut self, column: Column, raw: &str) {
        match column {
            Column::Datetime => self.datetime = parse_datetime(raw),
            Column::A => self.a = parse_number(raw),
            Column::B => self.b = parse_number(raw),
            Column::Ratio => self.ratio = parse_number(raw),
            Column::Deviation => self.deviation = parse_percent(raw),
            Column::Sex => self.sex = parse_sex(raw),
            Column::Age => self.age = parse_age(raw),
        }
    }

    /// Value of a numeric column; `None` for datetime and age.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn numeric(&self, column: Column) -> Option<f64> {
        match column {
            Column::A => self.a,
            Column::B => self.b,
            Column::Ratio => self.ratio,
            Column::Deviation => self.deviation,
            Column::Sex => self.sex.map(|s| s as f64),
            Column::Datetime | Column::Age => None,
        }
    }

    /// Whether the cell of `column` holds a value.
    #[must_use]
    pub fn has(&self, column: Column) -> bool {
        match column {
            Column::Datetime => self.datetime.is_some(),
            Column::Age => self.age.is_some(),
            _ => self.numeric(column).is_some(),
        }
    }

    /// `A / B` when both are present and the quotient is finite.
    #[must_use]
    pub fn a_over_b(&self) -> Option<f64> {
        let ratio = self.a? / self.b?;
        ratio.is_finite().then_some(ratio)
    }
}

/// Parses a number; empty, unparsable and non-finite cells are missing.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a number with an optional trailing `%`.
#[must_use]
pub fn parse_percent(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    parse_number(raw.strip_suffix('%').unwrap_or(raw))
}

/// Parses a sex code; only integral numbers are kept.
#[expect(clippy::cast_possible_truncation)]
#[must_use]
pub fn parse_sex(raw: &str) -> Option<i64> {
    let value = parse_number(raw)?;
    (value.fract() == 0.0 && value.abs() < 1e15).then_some(value as i64)
}

#[must_use]
pub fn parse_age(raw: &str) -> Option<AgeBucket> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| AgeBucket::new(raw))
}

/// Parses a timestamp in one of the accepted layouts.
///
/// ```
/// use pairstat_data::observation::parse_datetime;
///
/// let a = parse_datetime("2024-03-01 08:15:00").unwrap();
/// let b = parse_datetime("01.03.2024 08:15").unwrap();
/// assert_eq!(a, b);
/// assert!(parse_datetime("yesterday").is_none());
/// ```
#[must_use]
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
