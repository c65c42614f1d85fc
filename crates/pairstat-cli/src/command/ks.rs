use std::fmt::Write as _;

use clap::Args;
use pairstat_data::column::Column;
use pairstat_stats::{ecdf::Ecdf, ks::KsTest, quantiles};
use serde::Serialize;

use crate::{
    command::{CommonArg, Session, cohort_samples},
    plot::xy,
    util::{self, Output},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct KsArg {
    #[clap(flatten)]
    pub common: CommonArg,
    /// Column compared between the cohorts
    #[arg(long, default_value = "ratio")]
    pub column: Column,
}

#[derive(Debug, Clone, Serialize)]
struct KsReport {
    column: Column,
    alpha: f64,
    median_children: f64,
    median_adults: f64,
    test: KsTest,
    reject: bool,
}

pub(crate) fn run(arg: &KsArg) -> anyhow::Result<()> {
    let session = Session::load(&arg.common)?;
    compare(&session, arg.column)
}

pub(crate) fn compare(session: &Session, column: Column) -> anyhow::Result<()> {
    let split = cohort_samples(session, column)?;
    let test = KsTest::new(&split.children, &split.adults)?;
    let report = KsReport {
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
        dir.join("ks_children_vs_adults.txt"),
    )?;
    Output::save_json(&report, Some(dir.join("ks_children_vs_adults.json")))?;

    if session.plots {
        let children = Ecdf::new(&split.children).steps();
        let adults = Ecdf::new(&split.adults).steps();
        xy::ecdf_comparison(
            &dir.join("ks_ecdf_children_vs_adults.png"),
            &format!("ECDF of {column}: children vs adults"),
            [("children", children.as_slice()), ("adults", adults.as_slice())],
            &report.test,
        )?;
    }
    Ok(())
}

fn format_report(report: &KsReport) -> String {
    let test = &report.test;
    let mut out = String::new();
    writeln!(
        out,
        "Kolmogorov-Smirnov test of {}: children vs adults",
        report.column
    )
    .ok();
    writeln!(out, "==================================================").ok();
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
    writeln!(out, "D = {:.4}", test.statistic).ok();
    writeln!(
        out,
        "attained at x = {:.4} (F_children = {:.4}, F_adults = {:.4})",
        test.location.x, test.location.ecdf1, test.location.ecdf2
    )
    .ok();
    writeln!(out, "p-value = {:.4} ({})", test.p_value, test.method).ok();
    let verdict = if report.reject {
        "reject H0: the distributions differ"
    } else {
        "do not reject H0"
    };
    writeln!(out, "alpha = {}: {verdict}", report.alpha).ok();
    out
}
