use std::fmt::Write as _;

use clap::Args;
use pairstat_data::column::Column;
use pairstat_stats::estimation::NormalEstimate;
use serde::Serialize;
use tracing::warn;

use crate::{
    command::{CommonArg, Session},
    util::{self, Output},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct EstimateArg {
    #[clap(flatten)]
    pub common: CommonArg,
    /// Confidence level of the intervals
    #[arg(long, default_value_t = 0.95)]
    pub confidence: f64,
}

/// Estimate for one column, or why there is none.
#[derive(Debug, Clone, Serialize)]
struct ColumnEstimate {
    column: Column,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimate: Option<NormalEstimate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub(crate) fn run(arg: &EstimateArg) -> anyhow::Result<()> {
    let session = Session::load(&arg.common)?;
    estimate(&session, arg.confidence)
}

pub(crate) fn estimate(session: &Session, confidence: f64) -> anyhow::Result<()> {
    let dataset = &session.dataset;
    let estimates = Column::MEASUREMENTS
        .into_iter()
        .filter(|&c| dataset.has_column(c))
        .map(|column| match NormalEstimate::new(&dataset.values(column), confidence) {
            Ok(estimate) => ColumnEstimate {
                column,
                estimate: Some(estimate),
                error: None,
            },
            Err(err) => {
                warn!("Cannot estimate {column}: {err}");
                ColumnEstimate {
                    column,
                    estimate: None,
                    error: Some(err.to_string()),
                }
            }
        })
        .collect::<Vec<_>>();

    if estimates.is_empty() {
        warn!("None of A, B, ratio, deviation is present; nothing to estimate");
        return Ok(());
    }

    let dir = session.output_subdir("statistics")?;
    util::save_report(
        &format_report(&estimates, confidence),
        dir.join("normal_estimates.txt"),
    )?;
    Output::save_json(&estimates, Some(dir.join("normal_estimates.json")))?;
    Ok(())
}

fn format_report(estimates: &[ColumnEstimate], confidence: f64) -> String {
    let percent = confidence * 100.0;
    let mut out = String::new();
    writeln!(out, "Normal parameter estimates ({percent:.0}% confidence)").ok();
    writeln!(out, "==========================================").ok();
    for entry in estimates {
        writeln!(out).ok();
        writeln!(out, "{}:", entry.column).ok();
        let Some(e) = &entry.estimate else {
            let reason = entry.error.as_deref().unwrap_or("unknown error");
            writeln!(out, "  {reason}").ok();
            continue;
        };
        writeln!(out, "  n = {}", e.count).ok();
        writeln!(
            out,
            "  mean     = {:.4}  CI [{:.4}, {:.4}]",
            e.mean, e.mean_ci.lower, e.mean_ci.upper
        )
        .ok();
        writeln!(
            out,
            "  variance = {:.4}  CI [{:.4}, {:.4}]",
            e.variance, e.variance_ci.lower, e.variance_ci.upper
        )
        .ok();
        writeln!(
            out,
            "  std dev  = {:.4}  CI [{:.4}, {:.4}]",
            e.std_dev, e.std_dev_ci.lower, e.std_dev_ci.upper
        )
        .ok();
    }
    out
}
