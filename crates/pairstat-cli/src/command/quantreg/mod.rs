//! Quantile regression of one column on categorical and numeric covariates.

mod design;

use std::{fmt::Write as _, path::Path};

use anyhow::bail;
use clap::Args;
use pairstat_data::{column::Column, dataset::Dataset};
use pairstat_stats::quantreg::{self, Covariance, QuantRegFit, QuantRegOptions};
use serde::Serialize;
use tracing::{info, warn};

use self::design::{Design, levels};
use crate::{
    command::{CommonArg, Session},
    plot::xy::{self, Line},
    util::{self, Output},
};

const LINE_POINTS: usize = 100;

#[derive(Debug, Clone, Args)]
pub(crate) struct QuantregArg {
    #[clap(flatten)]
    pub common: CommonArg,
    #[clap(flatten)]
    pub model: ModelArg,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct ModelArg {
    /// Column explained by the model
    #[arg(long, default_value = "ratio")]
    pub dependent: Column,
    /// Explanatory columns (comma-separated); sex and age are treated as factors
    #[arg(long, value_delimiter = ',', default_values = ["sex", "age"])]
    pub covariates: Vec<Column>,
    /// Quantiles to fit (comma-separated)
    #[arg(long, value_delimiter = ',', default_values_t = [0.25, 0.5, 0.75])]
    pub quantiles: Vec<f64>,
    /// Bootstrap the standard errors with this many replicates instead of
    /// the kernel sandwich estimate
    #[arg(long)]
    pub bootstrap: Option<usize>,
    /// Seed of the bootstrap resampling
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

impl Default for ModelArg {
    fn default() -> Self {
        Self {
            dependent: Column::Ratio,
            covariates: vec![Column::Sex, Column::Age],
            quantiles: vec![0.25, 0.5, 0.75],
            bootstrap: None,
            seed: 0,
        }
    }
}

impl ModelArg {
    fn formula(&self) -> String {
        let covariates = self
            .covariates
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(" + ");
        format!("{} ~ {covariates}", self.dependent)
    }

    fn options(&self) -> QuantRegOptions {
        let covariance = match self.bootstrap {
            Some(replicates) => Covariance::Bootstrap {
                replicates,
                seed: self.seed,
            },
            None => Covariance::Robust,
        };
        QuantRegOptions {
            covariance,
            ..QuantRegOptions::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct QuantRegReport {
    formula: String,
    dependent: Column,
    covariates: Vec<Column>,
    fits: Vec<QuantRegFit>,
}

pub(crate) fn run(arg: &QuantregArg) -> anyhow::Result<()> {
    let session = Session::load(&arg.common)?;
    regress(&session, &arg.model)
}

pub(crate) fn regress(session: &Session, model: &ModelArg) -> anyhow::Result<()> {
    let dataset = &session.dataset;
    if !model.dependent.is_numeric() || model.dependent.is_categorical() {
        bail!("{} cannot be a dependent variable", model.dependent);
    }
    if model.covariates.is_empty() {
        bail!("At least one covariate is required");
    }
    for &covariate in &model.covariates {
        if covariate == Column::Datetime || covariate == model.dependent {
            bail!("{covariate} cannot be a covariate of {}", model.dependent);
        }
        dataset.require_column(covariate)?;
    }
    dataset.require_column(model.dependent)?;

    let formula = model.formula();
    info!("Model: {formula}");
    let design = Design::new(dataset, model.dependent, &model.covariates);
    info!(
        "{} complete rows, {} coefficients",
        design.n_obs(),
        design.names.len()
    );
    let regression = design.into_model()?;

    let options = model.options();
    let fits = model
        .quantiles
        .iter()
        .map(|&q| {
            info!("Fitting quantile {q}");
            regression.fit(q, &options)
        })
        .collect::<Result<Vec<_>, _>>()?;
    for fit in fits.iter().filter(|f| !f.converged) {
        warn!(
            "Quantile {} did not converge in {} iterations",
            fit.quantile, fit.iterations
        );
    }

    let report = QuantRegReport {
        formula,
        dependent: model.dependent,
        covariates: model.covariates.clone(),
        fits,
    };
    let dir = session.output_subdir("QR")?;
    let stem = format!("quantile_regression_{}", model.dependent);
    util::save_report(&format_report(&report), dir.join(format!("{stem}.txt")))?;
    Output::save_json(&report, Some(dir.join(format!("{stem}.json"))))?;

    if session.plots {
        for &covariate in &model.covariates {
            let path = dir.join(format!("{stem}_vs_{covariate}.png"));
            plot_covariate(&path, dataset, model, covariate)?;
        }
    }
    Ok(())
}

fn format_report(report: &QuantRegReport) -> String {
    let mut out = String::new();
    writeln!(out, "Quantile regression: {}", report.formula).ok();
    for fit in &report.fits {
        writeln!(out).ok();
        writeln!(out, "--- Quantile {} ---", fit.quantile).ok();
        writeln!(
            out,
            "Observations: {}    Df residuals: {}    Pseudo R-squared: {:.4}",
            fit.n_obs, fit.df_resid, fit.pseudo_r_squared
        )
        .ok();
        let status = if fit.converged {
            "converged"
        } else {
            "not converged"
        };
        let errors = match fit.covariance {
            Covariance::Robust => {
                "robust (Epanechnikov kernel, Hall-Sheather bandwidth)".to_owned()
            }
            Covariance::Bootstrap { seed, .. } => format!(
                "bootstrap ({} replicates, seed {seed})",
                fit.bootstrap_replicates.unwrap_or_default()
            ),
        };
        writeln!(
            out,
            "Iterations: {} ({status})    Standard errors: {errors}",
            fit.iterations
        )
        .ok();
        writeln!(
            out,
            "{:<20}{:>10}{:>11}{:>9}{:>9}{:>11}{:>11}",
            "", "coef", "std err", "t", "P>|t|", "[0.025", "0.975]"
        )
        .ok();
        for c in &fit.coefficients {
            writeln!(
                out,
                "{:<20}{:>10.4}{:>11.4}{:>9.3}{:>9.3}{:>11.4}{:>11.4}",
                c.name, c.estimate, c.std_error, c.t_value, c.p_value, c.ci.lower, c.ci.upper
            )
            .ok();
        }
    }
    out
}

/// Predicted quantile at each level from a treatment-coded single-factor fit.
fn level_predictions(params: &[f64], num_levels: usize) -> Vec<f64> {
    let intercept = params.first().copied().unwrap_or(f64::NAN);
    (0..num_levels)
        .map(|k| match k {
            0 => intercept,
            k => intercept + params.get(k).copied().unwrap_or(f64::NAN),
        })
        .collect()
}

/// Evenly spaced points from `start` to `end`, both included.
#[expect(clippy::cast_precision_loss)]
fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count < 2 {
        return vec![start];
    }
    let step = (end - start) / (count - 1) as f64;
    (0..count).map(|i| start + step * i as f64).collect()
}

/// Single-covariate fits per quantile drawn against `covariate`.
#[expect(clippy::cast_precision_loss)]
fn plot_covariate(
    path: &Path,
    dataset: &Dataset,
    model: &ModelArg,
    covariate: Column,
) -> anyhow::Result<()> {
    let design = Design::new(dataset, model.dependent, &[covariate]);
    let options = QuantRegOptions::default();
    let mut lines = Vec::with_capacity(model.quantiles.len());
    let caption = format!("Quantile regression: {} vs {covariate}", model.dependent);
    let descs = (covariate.name(), model.dependent.name());

    if covariate.is_categorical() {
        let data = dataset.complete_for(&[model.dependent, covariate]);
        let labels = levels(&data, covariate)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        for &q in &model.quantiles {
            let solution =
                quantreg::irls(&design.x, &design.y, q, options.max_iter, options.tolerance)?;
            let predictions = level_predictions(solution.params.as_slice(), labels.len());
            lines.push(Line {
                label: format!("quantile {q}"),
                points: predictions
                    .into_iter()
                    .enumerate()
                    .map(|(k, y)| (k as f64, y))
                    .collect(),
            });
        }
        xy::quantile_levels(path, &caption, descs, &labels, &lines)
    } else {
        let data = design
            .x
            .column(1)
            .iter()
            .copied()
            .zip(design.y.iter().copied())
            .collect::<Vec<_>>();
        let (min, max) = data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.0), hi.max(p.0))
            });
        let grid = linspace(min, max, LINE_POINTS);
        for &q in &model.quantiles {
            let solution =
                quantreg::irls(&design.x, &design.y, q, options.max_iter, options.tolerance)?;
            let (intercept, slope) = (solution.params[0], solution.params[1]);
            lines.push(Line {
                label: format!("quantile {q}"),
                points: grid.iter().map(|&x| (x, intercept + slope * x)).collect(),
            });
        }
        xy::quantile_lines(path, &caption, descs, &data, &lines)
    }
}
