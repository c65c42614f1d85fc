//! Conversion of pipe-delimited measurement logs to CSV.
//!
//! Each input line looks like
//!
//! ```text
//! 2024-01-05 08:12:44 | A=3.21 | B=1.98 | poměr=1.62 | odchylka=0.18% | pohlaví=1 | věk=20-40
//! ```

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use serde::Serialize;

use crate::{column::Column, error::DataError};

const SEPARATOR: &str = " | ";
const MIN_PARTS: usize = 7;

/// Outcome of a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConvertSummary {
    pub rows: usize,
    pub skipped: usize,
}

/// Splits one line into cells ordered like [`Column::ALL`].
///
/// Returns `None` for blank lines and lines with too few parts.
#[must_use]
pub fn parse_line(line: &str) -> Option<[String; 7]> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let parts = line.split(SEPARATOR).collect::<Vec<_>>();
    if parts.len() < MIN_PARTS {
        return None;
    }

    let mut cells: [String; 7] = Default::default();
    cells[0] = parts[0].to_owned();
    for part in &parts[1..] {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let (key, mut value) = (key.trim(), value.trim());
        let Some(column) = Column::ALL[1..].iter().find(|c| c.header() == key) else {
            continue;
        };
        if *column == Column::Deviation {
            value = value.strip_suffix('%').unwrap_or(value);
        }
        let index = Column::ALL.iter().position(|c| c == column).unwrap_or(0);
        cells[index] = value.to_owned();
    }
    Some(cells)
}

/// Converts every line of `input` and writes CSV with the canonical header.
pub fn convert<R, W>(input: R, output: W) -> Result<ConvertSummary, DataError>
where
    R: BufRead,
    W: io::Write,
{
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(Column::ALL.map(Column::header))?;

    let mut summary = ConvertSummary::default();
    for line in input.lines() {
        let line = line?;
        match parse_line(&line) {
            Some(cells) => {
                writer.write_record(&cells)?;
                summary.rows += 1;
            }
            None => summary.skipped += 1,
        }
    }
    writer.flush()?;
    Ok(summary)
}

pub fn convert_file<P, Q>(input: P, output: Q) -> Result<ConvertSummary, DataError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input = BufReader::new(File::open(input)?);
    let output = File::create(output)?;
    convert(input, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    const LOG: &str = "\
2024-01-05 08:12:44 | A=3.21 | B=1.98 | poměr=1.62 | odchylka=0.18% | pohlaví=1 | věk=20-40

malformed line | A=1
2024-01-05 09:00:00 | A=3.00 | B=2.00 | note | poměr=1.5 | pohlaví=2 | věk=0-10
";

    #[test]
    fn test_parse_line_strips_percent() {
        let cells = parse_line(LOG.lines().next().unwrap()).unwrap();
        assert_eq!(cells[0], "2024-01-05 08:12:44");
        assert_eq!(cells[4], "0.18");
        assert_eq!(cells[6], "20-40");
    }

    #[test]
    fn test_convert_counts_and_reads_back() {
        let mut out = Vec::new();
        let summary = convert(LOG.as_bytes(), &mut out).unwrap();
        assert_eq!(summary, ConvertSummary { rows: 2, skipped: 2 });

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("datetime,A,B,poměr,odchylka,pohlaví,věk\n"));

        let dataset = Dataset::from_reader(text.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.values(Column::Deviation), vec![0.18]);
        assert_eq!(dataset.values(Column::Ratio), vec![1.62, 1.5]);
        assert_eq!(dataset.sexes(), vec![1, 2]);
    }

    #[test]
    fn test_convert_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        let output = dir.path().join("output.csv");
        std::fs::write(&input, LOG).unwrap();
        let summary = convert_file(&input, &output).unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(Dataset::from_path(&output).unwrap().len(), 2);
    }
}
