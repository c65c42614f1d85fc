use pairstat_data::column::Column;
use tracing::info;

use crate::command::{
    CommonArg, Session, estimate, graphics, ks, mann_whitney, median,
    quantreg::{self, ModelArg},
    run_step,
};

const PREVIEW_ROWS: usize = 5;
const DEFAULT_CONFIDENCE: f64 = 0.95;

pub(crate) fn run(arg: &CommonArg) -> anyhow::Result<()> {
    let session = Session::load(arg)?;
    run_session(&session, &ModelArg::default())
}

/// Every procedure in order; skippable failures do not stop the others.
pub(crate) fn run_session(session: &Session, model: &ModelArg) -> anyhow::Result<()> {
    let columns = session
        .dataset
        .columns()
        .map(Column::name)
        .collect::<Vec<_>>();
    info!("Columns: {}", columns.join(", "));
    for (index, row) in session.dataset.preview(PREVIEW_ROWS).iter().enumerate() {
        info!("Row {index}: {row:?}");
    }

    run_step("graphics", || graphics::run(session))?;
    run_step("normal estimates", || {
        estimate::estimate(session, DEFAULT_CONFIDENCE)
    })?;
    run_step("Kolmogorov-Smirnov test", || {
        ks::compare(session, Column::Ratio)
    })?;
    run_step("median of A/B", || median::run(session))?;
    run_step("Mann-Whitney test", || {
        mann_whitney::compare(session, Column::Ratio)
    })?;
    run_step("quantile regression", || quantreg::regress(session, model))?;
    info!("Outputs written to {}", session.output_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::test_util;

    #[test]
    fn test_runs_every_procedure() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_util::session(dir.path());
        run_session(&session, &ModelArg::default()).unwrap();
        for file in [
            "outliers/outliers_ratio_by_age.txt",
            "statistics/normal_estimates.txt",
            "statistics/normal_estimates.json",
            "statistics/ks_children_vs_adults.txt",
            "statistics/median_ratio.txt",
            "statistics/mann_whitney_children_vs_adults.json",
            "QR/quantile_regression_ratio.txt",
            "QR/quantile_regression_ratio.json",
        ] {
            assert!(dir.path().join(file).exists(), "{file} missing");
        }
    }

    #[test]
    fn test_missing_columns_do_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_util::session(dir.path());
        let csv = "A,B\n1.0,2.0\n1.5,2.5\n";
        session.dataset = pairstat_data::dataset::Dataset::from_reader(csv.as_bytes()).unwrap();
        run_session(&session, &ModelArg::default()).unwrap();
        let report =
            std::fs::read_to_string(dir.path().join("statistics/normal_estimates.txt")).unwrap();
        assert!(report.contains("A:\n  n = 2"));
        assert!(!dir.path().join("QR").exists());
    }
}
