use std::fmt::Write as _;

use pairstat_data::column::Column;
use pairstat_stats::median::AsymptoticMedian;
use tracing::info;

use crate::{
    command::Session,
    util::{self, Output},
};

const CONFIDENCE: f64 = 0.95;

pub(crate) fn run(session: &Session) -> anyhow::Result<()> {
    let dataset = &session.dataset;
    dataset.require_column(Column::A)?;
    dataset.require_column(Column::B)?;

    let ratios = dataset
        .rows()
        .iter()
        .filter_map(|r| r.a_over_b())
        .collect::<Vec<_>>();
    info!("{} finite A/B ratios", ratios.len());
    let result = AsymptoticMedian::new(&ratios, CONFIDENCE)?;

    let dir = session.output_subdir("statistics")?;
    util::save_report(&format_report(&result), dir.join("median_ratio.txt"))?;
    Output::save_json(&result, Some(dir.join("median_ratio.json")))?;
    Ok(())
}

fn format_report(result: &AsymptoticMedian) -> String {
    let mut out = String::new();
    writeln!(out, "Asymptotic distribution of the median of A/B").ok();
    writeln!(out, "============================================").ok();
    writeln!(out, "n                  = {}", result.count).ok();
    writeln!(out, "median             = {:.5}", result.median).ok();
    writeln!(out, "density at median  = {:.5}", result.density).ok();
    writeln!(out, "variance           = {:.5}", result.std_error.powi(2)).ok();
    writeln!(out, "standard deviation = {:.5}", result.std_error).ok();
    writeln!(
        out,
        "{:.0}% CI             = [{:.5}, {:.5}]",
        result.confidence * 100.0,
        result.ci.lower,
        result.ci.upper
    )
    .ok();
    out
}

#[cfg(test)]
mod tests {
    use pairstat_data::dataset::Dataset;

    use super::*;
    use crate::command::test_util;

    #[test]
    fn test_report_uses_five_decimals() {
        let values = (1..=20).map(f64::from).collect::<Vec<_>>();
        let result = AsymptoticMedian::new(&values, CONFIDENCE).unwrap();
        let report = format_report(&result);
        assert!(report.contains("n                  = 20\n"));
        assert!(report.contains("median             = 10.50000\n"));
        assert!(report.contains("95% CI             = ["));
    }

    #[test]
    fn test_missing_b_column_is_skippable() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_util::session(dir.path());
        session.dataset = Dataset::from_reader("A\n1.0\n".as_bytes()).unwrap();
        let err = run(&session).unwrap_err();
        assert!(crate::command::is_skippable(&err));
    }

    #[test]
    fn test_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_util::session(dir.path());
        run(&session).unwrap();
        let json =
            std::fs::read_to_string(dir.path().join("statistics/median_ratio.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["count"], 60);
        assert!(value["ci"]["lower"].as_f64().unwrap() < value["median"].as_f64().unwrap());
    }
}
