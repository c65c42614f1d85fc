use std::fmt::Write as _;

use clap::Args;
use pairstat_data::column::Column;
use pairstat_stats::{mann_whitney::MannWhitneyTest, quantiles};
use serde::Serialize;

use crate::{
    command::{CommonArg, Session, cohort_samples},
    util::{self, Output},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct MannWhitneyArg {
    #[clap(flatten)]
    pub common: CommonArg,
    /// Column compared between the cohorts
    #[arg(long, default_value = "ratio")]
    pub column: Column,
}

#[derive(Debug, Clone, Serialize)]
struct MannWhitneyReport {
    column: Column,
    alpha: f64,
    median_children: f64,
    median_adults: f64,
    test: MannWhitneyTest,
    reject: bool,
}

pub(crate) fn run(arg: &MannWhitneyArg) -> anyhow::Result<()> {
    let session = Session::load(&arg.common)?;
    compare(&session, arg.column)
}

pub(crate) fn compare(session: &Session, column: Column) -> anyhow::Result<()> {
    let split = cohort_samples(session, column)?;
    let test = MannWhitneyTest::new(&split.children, &split.adults)?;
    let report = MannWhitneyReport {
        column,
        alpha: session.alpha,
        median_children: quantiles::median(&split.children),
        median_adults: quantiles::median(&split.adults),
        reject: test.rejects(session.alpha),
        test,
    };

    let dir = session.output_subdir("statistics")?;
    util::save_report(
        &format_report(&report),
        dir.join("mann_whitney_children_vs_adults.txt"),
    )?;
    Output::save_json(
        &report,
        Some(dir.join("mann_whitney_children_vs_adults.json")),
    )?;
    Ok(())
}

fn format_report(report: &MannWhitneyReport) -> String {
    let test = &report.test;
    let mut out = String::new();
    writeln!(
        out,
        "Mann-Whitney U test of {}: children vs adults",
        report.column
    )
    .ok();
    writeln!(out, "=============================================").ok();
    writeln!(
        out,
        "children: n = {}, median = {:.4}",
        test.n1, report.median_children
    )
    .ok();
    writeln!(
        out,
        "adults:   n = {}, median = {:.4}",
        test.n2, report.median_adults
    )
    .ok();
    writeln!(out, "U = {:.1}", test.u_statistic).ok();
    writeln!(out, "p-value = {:.4} ({})", test.p_value, test.method).ok();
    let verdict = if report.reject {
        "reject H0: the distributions differ in location"
    } else {
        "do not reject H0"
    };
    writeln!(out, "alpha = {}: {verdict}", report.alpha).ok();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::test_util;

    #[test]
    fn test_report_verdict() {
        let test = MannWhitneyTest::new(&[1.0, 2.0, 3.0, 5.0, 6.0], &[4.0, 7.0, 8.0, 9.0, 10.0])
            .unwrap();
        let report = MannWhitneyReport {
            column: Column::Ratio,
            alpha: 0.01,
            median_children: 3.0,
            median_adults: 8.0,
            reject: test.rejects(0.01),
            test,
        };
        let text = format_report(&report);
        assert!(text.contains("children: n = 5, median = 3.0000\n"));
        assert!(text.contains("U = 2.0\n"));
        assert!(text.contains("(exact)"));
        assert!(text.contains("alpha = 0.01: do not reject H0"));
    }

    #[test]
    fn test_synthetic_children_rank_lower() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_util::session(dir.path());
        compare(&session, Column::Ratio).unwrap();
        let json = std::fs::read_to_string(
            dir.path()
                .join("statistics/mann_whitney_children_vs_adults.json"),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let u = value["test"]["u_statistic"].as_f64().unwrap();
        assert!(u < 24.0 * 36.0 / 2.0);
        assert_eq!(value["test"]["method"], "asymptotic");
    }
}
