//! Descriptive plots of the measurements and the ratio outlier listing.

mod outliers;

use std::path::Path;

use pairstat_data::{column::Column, dataset::Dataset, observation::Observation};
use pairstat_stats::{correlation::CorrelationMatrix, probplot::NormalProbabilityPlot};
use tracing::{debug, info, warn};

use crate::{
    command::Session,
    plot::{
        distribution::{self, Group},
        matrix,
        xy::{self, Line},
    },
    util,
};

const HISTOGRAM_BINS: usize = 30;
const DISTRIBUTION_COLUMNS: [Column; 3] = [Column::A, Column::B, Column::Ratio];

pub(crate) fn run(session: &Session) -> anyhow::Result<()> {
    let dataset = &session.dataset;
    dataset.require_column(Column::A)?;
    dataset.require_column(Column::B)?;
    let data = dataset.complete_for(&[Column::Datetime, Column::A, Column::B]);
    info!(
        "{} of {} rows have datetime, A and B",
        data.len(),
        dataset.len()
    );

    if session.plots {
        scatter_time_groups(session, &data)?;
        ratio_by_group(session, &data)?;
        distributions(session, &data)?;
        correlations(session, &data)?;
        pair_plot(session, &data)?;
    } else {
        info!("Image output disabled");
    }

    let dir = session.output_subdir("outliers")?;
    util::save_report(
        &outliers::ratio_by_age(&data),
        dir.join("outliers_ratio_by_age.txt"),
    )?;
    Ok(())
}

#[expect(clippy::cast_precision_loss)]
fn timestamp(row: &Observation) -> Option<f64> {
    row.datetime.map(|dt| dt.and_utc().timestamp() as f64)
}

/// Scatter of A against B and the A, B time series of `rows`.
fn scatter_time(dir: &Path, title: &str, rows: &[&Observation]) -> anyhow::Result<()> {
    let mut rows = rows.to_vec();
    rows.sort_by_key(|r| r.datetime);
    let pairs = rows
        .iter()
        .filter_map(|r| Some((r.a?, r.b?)))
        .collect::<Vec<_>>();
    if pairs.is_empty() {
        return Ok(());
    }
    util::create_dir(dir)?;
    xy::scatter(
        &dir.join("scatter_A_B.png"),
        &format!("A vs B ({title})"),
        ("A", "B"),
        &pairs,
    )?;

    let lines = [("A", Column::A), ("B", Column::B)].map(|(label, column)| Line {
        label: label.to_owned(),
        points: rows
            .iter()
            .filter_map(|&r| Some((timestamp(r)?, r.numeric(column)?)))
            .collect(),
    });
    xy::time_series(
        &dir.join("time_A_B.png"),
        &format!("A and B over time ({title})"),
        "value",
        &lines,
    )?;
    debug!("Wrote {}", dir.display());
    Ok(())
}

fn scatter_time_groups(session: &Session, data: &Dataset) -> anyhow::Result<()> {
    let base = session.output_subdir("scatter_time")?;
    let all = data.rows().iter().collect::<Vec<_>>();
    scatter_time(&base.join("ALL"), "all", &all)?;

    for sex in data.sexes() {
        let rows = data
            .rows()
            .iter()
            .filter(|r| r.sex == Some(sex))
            .collect::<Vec<_>>();
        scatter_time(
            &base.join("sex").join(sex.to_string()),
            &format!("sex {sex}"),
            &rows,
        )?;
    }

    for bucket in data.age_buckets() {
        let rows = data
            .rows()
            .iter()
            .filter(|r| r.age.as_ref() == Some(&bucket))
            .collect::<Vec<_>>();
        scatter_time(
            &base.join("age").join(bucket.file_name()),
            &format!("age {bucket}"),
            &rows,
        )?;
    }
    Ok(())
}

/// Ratio values grouped by age bucket and by sex, empty groups left out.
fn ratio_groups(data: &Dataset) -> (Vec<Group>, Vec<Group>) {
    let collect = |label: String, keep: &dyn Fn(&Observation) -> bool| Group {
        label,
        values: data
            .rows()
            .iter()
            .filter(|&r| keep(r))
            .filter_map(|r| r.ratio)
            .collect(),
    };
    let by_age = data
        .age_buckets()
        .into_iter()
        .map(|bucket| {
            collect(bucket.label().to_owned(), &|r: &Observation| {
                r.age.as_ref() == Some(&bucket)
            })
        })
        .filter(|g| !g.values.is_empty())
        .collect();
    let by_sex = data
        .sexes()
        .into_iter()
        .map(|sex| collect(sex.to_string(), &|r: &Observation| r.sex == Some(sex)))
        .filter(|g| !g.values.is_empty())
        .collect();
    (by_age, by_sex)
}

fn ratio_by_group(session: &Session, data: &Dataset) -> anyhow::Result<()> {
    if !data.has_column(Column::Ratio) {
        warn!("No {} column, skipping box and violin plots", Column::Ratio);
        return Ok(());
    }
    let (by_age, by_sex) = ratio_groups(data);
    let box_dir = session.output_subdir("boxplots")?;
    let violin_dir = session.output_subdir("violin")?;
    for (groups, key) in [(&by_age, "age"), (&by_sex, "sex")] {
        if groups.is_empty() {
            warn!("No ratio values grouped by {key}");
            continue;
        }
        distribution::box_plot(
            &box_dir.join(format!("box_ratio_by_{key}.png")),
            &format!("Ratio by {key}"),
            (key, "ratio"),
            groups,
        )?;
        distribution::violin_plot(
            &violin_dir.join(format!("violin_ratio_by_{key}.png")),
            &format!("Ratio distribution by {key}"),
            (key, "ratio"),
            groups,
        )?;
    }
    Ok(())
}

fn distributions(session: &Session, data: &Dataset) -> anyhow::Result<()> {
    let hist_dir = session.output_subdir("histograms")?;
    let qq_dir = session.output_subdir("qqplots")?;
    for column in DISTRIBUTION_COLUMNS {
        let values = data.values(column);
        if values.is_empty() {
            warn!("No {column} values, skipping histogram and Q-Q plot");
            continue;
        }
        distribution::histogram_kde(
            &hist_dir.join(format!("hist_{column}.png")),
            &format!("Histogram of {column}"),
            column.name(),
            &values,
            HISTOGRAM_BINS,
        )?;
        match NormalProbabilityPlot::new(&values) {
            Ok(plot) => xy::qq_plot(
                &qq_dir.join(format!("qq_{column}.png")),
                &format!("Normal Q-Q plot of {column}"),
                &plot,
            )?,
            Err(err) => warn!("Skipping Q-Q plot of {column}: {err}"),
        }
    }
    Ok(())
}

fn present_measurements(data: &Dataset) -> Vec<Column> {
    Column::MEASUREMENTS
        .into_iter()
        .filter(|&c| data.has_column(c))
        .collect()
}

fn correlations(session: &Session, data: &Dataset) -> anyhow::Result<()> {
    let columns = present_measurements(data);
    if columns.len() < 2 || !data.has_column(Column::Age) {
        warn!("Correlation heat maps need an age column and two measurements");
        return Ok(());
    }
    let dir = session.output_subdir("correlation")?;
    let names = columns.iter().map(|c| c.name().to_owned()).collect::<Vec<_>>();
    let cohorts = &session.cohorts;
    let subsets = [
        (
            "children",
            data.filter(|r| r.age.as_ref().is_some_and(|a| cohorts.is_child(a))),
        ),
        (
            "adults",
            data.filter(|r| r.age.as_ref().is_some_and(|a| cohorts.is_adult(a))),
        ),
    ];
    for (cohort, subset) in subsets {
        if subset.is_empty() {
            warn!("No rows in the {cohort} cohort, skipping its heat map");
            continue;
        }
        let values = columns
            .iter()
            .map(|&c| subset.values_or_nan(c))
            .collect::<Vec<_>>();
        let matrix = CorrelationMatrix::new(names.clone(), &values);
        matrix::heatmap(
            &dir.join(format!("corr_{cohort}.png")),
            &format!("Pearson correlation ({cohort})"),
            &matrix,
        )?;
    }
    Ok(())
}

/// Names and values of the present measurements, restricted to the rows
/// where every one of them is present.
fn pair_columns(data: &Dataset) -> (Vec<String>, Vec<Vec<f64>>) {
    let columns = present_measurements(data);
    let complete = data.complete_for(&columns);
    let names = columns.iter().map(|c| c.name().to_owned()).collect();
    let values = columns.iter().map(|&c| complete.values(c)).collect();
    (names, values)
}

fn pair_plot(session: &Session, data: &Dataset) -> anyhow::Result<()> {
    let (names, values) = pair_columns(data);
    if names.len() < 2 {
        warn!("Pair plot needs at least two measurement columns");
        return Ok(());
    }
    let dir = session.output_subdir("pairplot")?;
    matrix::pair_plot(
        &dir.join(format!("pairplot_{}.png", names.join("_"))),
        "Pair plot",
        &names,
        &values,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::test_util;

    #[test]
    fn test_ratio_groups_are_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_util::session(dir.path());
        let (by_age, by_sex) = ratio_groups(&session.dataset);
        let labels = by_age.iter().map(|g| g.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, ["0-10", "10-20", "20-40", "40-60", "60-80"]);
        assert!(by_age.iter().all(|g| g.values.len() == 12));
        assert_eq!(by_sex.len(), 2);
        assert_eq!(by_sex[0].label, "1");
    }

    #[test]
    fn test_pair_columns_keep_complete_rows() {
        let csv = "A,B,poměr,odchylka\n\
                   1.0,2.0,0.5,\n\
                   1.5,2.5,0.6,-3.0\n\
                   2.0,,0.7,-2.0\n\
                   2.5,3.5,0.8,-1.0\n";
        let data = Dataset::from_reader(csv.as_bytes()).unwrap();
        let (names, values) = pair_columns(&data);
        assert_eq!(names, ["A", "B", "ratio", "deviation"]);
        assert_eq!(values[0], [1.5, 2.5]);
        assert_eq!(values[3], [-3.0, -1.0]);
        assert!(values.iter().all(|v| v.len() == 2));
    }

    #[test]
    fn test_outlier_report_without_plots() {
        let dir = tempfile::tempdir().unwrap();
        let session = test_util::session(dir.path());
        run(&session).unwrap();
        let report =
            std::fs::read_to_string(dir.path().join("outliers/outliers_ratio_by_age.txt")).unwrap();
        assert_eq!(report.lines().filter(|l| l.starts_with("Age ")).count(), 5);
        assert!(!dir.path().join("histograms").exists());
    }

    #[test]
    #[ignore = "requires system fonts for chart text"]
    fn test_all_images_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = test_util::session(dir.path());
        session.plots = true;
        run(&session).unwrap();
        for image in [
            "scatter_time/ALL/scatter_A_B.png",
            "scatter_time/sex/1/time_A_B.png",
            "scatter_time/age/20-40/scatter_A_B.png",
            "boxplots/box_ratio_by_age.png",
            "violin/violin_ratio_by_sex.png",
            "histograms/hist_ratio.png",
            "qqplots/qq_A.png",
            "correlation/corr_children.png",
            "correlation/corr_adults.png",
            "pairplot/pairplot_A_B_ratio_deviation.png",
        ] {
            assert!(dir.path().join(image).exists(), "{image} missing");
        }
    }
}
