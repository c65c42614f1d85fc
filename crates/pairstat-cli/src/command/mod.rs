use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use pairstat_data::{
    DataError,
    cohort::{CohortSplit, Cohorts, parse_bucket_list},
    column::Column,
    dataset::Dataset,
};
use pairstat_stats::error::StatsError;
use tracing::{info, warn};

use self::{
    convert::ConvertArg, estimate::EstimateArg, ks::KsArg, mann_whitney::MannWhitneyArg,
    quantreg::QuantregArg,
};

mod all;
mod convert;
mod estimate;
mod graphics;
mod ks;
mod mann_whitney;
mod median;
mod quantreg;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Procedure to run; all of them when omitted
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Run every procedure in sequence
    All(#[clap(flatten)] CommonArg),
    /// Convert a pipe-delimited text log to CSV
    Convert(#[clap(flatten)] ConvertArg),
    /// Draw descriptive plots and list outliers
    Graphics(#[clap(flatten)] CommonArg),
    /// Estimate normal parameters with confidence intervals
    Estimate(#[clap(flatten)] EstimateArg),
    /// Asymptotic distribution of the median of A/B
    Median(#[clap(flatten)] CommonArg),
    /// Kolmogorov-Smirnov test, children vs adults
    Ks(#[clap(flatten)] KsArg),
    /// Mann-Whitney U test, children vs adults
    MannWhitney(#[clap(flatten)] MannWhitneyArg),
    /// Quantile regression with robust or bootstrap standard errors
    Quantreg(#[clap(flatten)] QuantregArg),
}

/// Options shared by every analysis command.
#[derive(Debug, Clone, Args)]
pub(crate) struct CommonArg {
    /// Input CSV file
    #[arg(long, default_value = "input_data.csv")]
    pub input: PathBuf,
    /// Directory receiving reports and images
    #[arg(long, default_value = "outputs")]
    pub output_dir: PathBuf,
    /// Significance level of the tests
    #[arg(long, default_value_t = 0.05)]
    pub alpha: f64,
    /// Age buckets forming the children cohort (comma-separated)
    #[arg(long, default_value = "0-10,10-20")]
    pub children: String,
    /// Age buckets forming the adults cohort (comma-separated)
    #[arg(long, default_value = "20-40,40-60,60-80")]
    pub adults: String,
    /// Skip image output
    #[arg(long)]
    pub no_plots: bool,
}

impl Default for CommonArg {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input_data.csv"),
            output_dir: PathBuf::from("outputs"),
            alpha: 0.05,
            children: "0-10,10-20".to_owned(),
            adults: "20-40,40-60,60-80".to_owned(),
            no_plots: false,
        }
    }
}

/// A loaded dataset and the settings every procedure reads.
#[derive(Debug)]
pub(crate) struct Session {
    pub dataset: Dataset,
    pub output_dir: PathBuf,
    pub alpha: f64,
    pub cohorts: Cohorts,
    pub plots: bool,
}

impl Session {
    pub(crate) fn load(arg: &CommonArg) -> anyhow::Result<Self> {
        info!("Loading data from {}", arg.input.display());
        let dataset = Dataset::from_path(&arg.input)
            .with_context(|| format!("Failed to read input file: {}", arg.input.display()))?;
        info!("Loaded {} rows", dataset.len());
        Ok(Self::new(dataset, arg))
    }

    pub(crate) fn new(dataset: Dataset, arg: &CommonArg) -> Self {
        Self {
            dataset,
            output_dir: arg.output_dir.clone(),
            alpha: arg.alpha,
            cohorts: Cohorts::new(
                parse_bucket_list(&arg.children),
                parse_bucket_list(&arg.adults),
            ),
            plots: !arg.no_plots,
        }
    }

    /// `dir` under the output directory, created if missing.
    pub(crate) fn output_subdir(&self, dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let path = self.output_dir.join(dir);
        crate::util::create_dir(&path)?;
        Ok(path)
    }
}

/// Smallest cohort size accepted by the two-sample tests.
pub(crate) const MIN_COHORT_SIZE: usize = 5;

/// Values of `column` for children and adults, each at least
/// [`MIN_COHORT_SIZE`] long.
pub(crate) fn cohort_samples(session: &Session, column: Column) -> anyhow::Result<CohortSplit> {
    let dataset = &session.dataset;
    dataset.require_column(column)?;
    dataset.require_column(Column::Age)?;
    let split = session.cohorts.split(dataset, column);
    info!(
        "{column}: {} children, {} adults",
        split.children.len(),
        split.adults.len()
    );
    let smaller = split.children.len().min(split.adults.len());
    if smaller < MIN_COHORT_SIZE {
        return Err(StatsError::InsufficientData {
            needed: MIN_COHORT_SIZE,
            actual: smaller,
        }
        .into());
    }
    Ok(split)
}

/// Whether a failed procedure should be logged and skipped instead of
/// aborting the run.
pub(crate) fn is_skippable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<StatsError>().is_some()
        || matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::MissingColumn { .. })
        )
}

/// Runs one procedure of a multi-procedure run, logging skippable failures.
pub(crate) fn run_step<F>(name: &str, step: F) -> anyhow::Result<()>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    info!("Running {name}");
    match step() {
        Ok(()) => Ok(()),
        Err(err) if is_skippable(&err) => {
            warn!("Skipping {name}: {err:#}");
            Ok(())
        }
        Err(err) => Err(err.context(format!("{name} failed"))),
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode.unwrap_or(Mode::All(CommonArg::default())) {
        Mode::All(arg) => all::run(&arg)?,
        Mode::Convert(arg) => convert::run(&arg)?,
        Mode::Graphics(arg) => graphics::run(&Session::load(&arg)?)?,
        Mode::Estimate(arg) => estimate::run(&arg)?,
        Mode::Median(arg) => median::run(&Session::load(&arg)?)?,
        Mode::Ks(arg) => ks::run(&arg)?,
        Mode::MannWhitney(arg) => mann_whitney::run(&arg)?,
        Mode::Quantreg(arg) => quantreg::run(&arg)?,
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::fmt::Write as _;

    use pairstat_data::dataset::Dataset;

    use super::{CommonArg, Session};

    /// 60 rows over five age buckets and two sexes; adults have larger ratios.
    pub(crate) fn synthetic_csv() -> String {
        let buckets = ["0-10", "10-20", "20-40", "40-60", "60-80"];
        let mut csv = String::from("datetime,A,B,poměr,odchylka,pohlaví,věk\n");
        for i in 0..60_u32 {
            let bucket = i % 5;
            let sex = 1 + i % 2;
            let b = 2.0 + f64::from(i % 7) * 0.1;
            let ratio = 1.4 + f64::from(bucket) * 0.05 + f64::from(i % 11) * 0.01;
            let a = ratio * b;
            let deviation = (ratio - 1.618) / 1.618 * 100.0;
            writeln!(
                csv,
                "2024-01-{:02} {:02}:{:02}:00,{a:.4},{b:.4},{ratio:.4},{deviation:.2}%,{sex},{}",
                1 + i / 24,
                i % 24,
                (i * 7) % 60,
                buckets[bucket as usize],
            )
            .unwrap();
        }
        csv
    }

    pub(crate) fn session(output_dir: &std::path::Path) -> Session {
        let dataset = Dataset::from_reader(synthetic_csv().as_bytes()).unwrap();
        let arg = CommonArg {
            output_dir: output_dir.to_owned(),
            no_plots: true,
            ..CommonArg::default()
        };
        Session::new(dataset, &arg)
    }
}
