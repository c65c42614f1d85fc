//! Columns of the measurement table.

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::error::UnknownColumn;

/// A column of the input table.
///
/// Each column has a canonical CSV header (the one written by the text
/// converter) and a short English name used in reports and file names.
/// Both, plus a few aliases, are accepted when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Column {
    Datetime,
    A,
    B,
    Ratio,
    Deviation,
    Sex,
    Age,
}

impl Column {
    pub const ALL: [Self; 7] = [
        Self::Datetime,
        Self::A,
        Self::B,
        Self::Ratio,
        Self::Deviation,
        Self::Sex,
        Self::Age,
    ];

    /// Columns holding continuous measurements.
    pub const MEASUREMENTS: [Self; 4] = [Self::A, Self::B, Self::Ratio, Self::Deviation];

    /// Canonical CSV header.
    #[must_use]
    pub fn header(self) -> &'static str {
        match self {
            Self::Datetime => "datetime",
            Self::A => "A",
            Self::B => "B",
            Self::Ratio => "poměr",
            Self::Deviation => "odchylka",
            Self::Sex => "pohlaví",
            Self::Age => "věk",
        }
    }

    /// English name used in reports and output file names.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Datetime => "datetime",
            Self::A => "A",
            Self::B => "B",
            Self::Ratio => "ratio",
            Self::Deviation => "deviation",
            Self::Sex => "sex",
            Self::Age => "age",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Datetime => &[],
            Self::A => &["a"],
            Self::B => &["b"],
            Self::Ratio => &["pomer"],
            Self::Deviation => &[],
            Self::Sex => &["pohlavi"],
            Self::Age => &["vek"],
        }
    }

    /// Matches a CSV header cell against the known headers.
    #[must_use]
    pub fn from_header(header: &str) -> Option<Self> {
        let header = header.trim().trim_start_matches('\u{feff}');
        Self::ALL.into_iter().find(|column| {
            column.header() == header || column.name() == header || column.aliases().contains(&header)
        })
    }

    /// Whether the column enters models as a factor rather than a number.
    #[must_use]
    pub fn is_categorical(self) -> bool {
        matches!(self, Self::Sex | Self::Age)
    }

    /// Whether per-row values can be read as `f64`.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::A | Self::B | Self::Ratio | Self::Deviation | Self::Sex
        )
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_header(s).ok_or_else(|| UnknownColumn { name: s.to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_and_aliases_parse() {
        assert_eq!("poměr".parse::<Column>(), Ok(Column::Ratio));
        assert_eq!("ratio".parse::<Column>(), Ok(Column::Ratio));
        assert_eq!("a".parse::<Column>(), Ok(Column::A));
        assert_eq!(" věk ".parse::<Column>(), Ok(Column::Age));
        assert_eq!(Column::from_header("\u{feff}datetime"), Some(Column::Datetime));
        assert!("weight".parse::<Column>().is_err());
    }

    #[test]
    fn test_display_uses_english_name() {
        assert_eq!(Column::Deviation.to_string(), "deviation");
        assert_eq!(Column::Deviation.header(), "odchylka");
        for column in Column::ALL {
            assert_eq!(column.to_string().parse::<Column>(), Ok(column));
        }
    }

    #[test]
    fn test_kinds() {
        assert!(Column::Sex.is_categorical() && Column::Sex.is_numeric());
        assert!(Column::Age.is_categorical() && !Column::Age.is_numeric());
        assert!(!Column::Datetime.is_numeric());
    }
}
