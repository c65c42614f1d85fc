//! Scatter, line and step charts on numeric axes.

use std::path::Path;

use chrono::DateTime;
use pairstat_stats::{ks::KsTest, probplot::NormalProbabilityPlot};
use plotters::prelude::*;

use super::{
    GOLDEN_RATIO, SIZE, build_chart, category_label, category_range, color, draw_dashed_hline,
    draw_legend, open_area, padded_range, plot_error,
};

/// A named line of `(x, y)` points.
#[derive(Debug, Clone)]
pub(crate) struct Line {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

pub(crate) fn scatter(
    path: &Path,
    caption: &str,
    (x_desc, y_desc): (&str, &str),
    points: &[(f64, f64)],
) -> anyhow::Result<()> {
    let area = open_area(path, SIZE)?;
    let x_range = padded_range(points.iter().map(|p| p.0));
    let y_range = padded_range(points.iter().map(|p| p.1));
    let mut chart = build_chart(&area, caption, x_range, y_range)?;
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()
        .map_err(plot_error)?;
    chart
        .draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 4, color(0).mix(0.6).filled())),
        )
        .map_err(plot_error)?;
    area.present().map_err(plot_error)?;
    Ok(())
}

fn format_timestamp(seconds: f64) -> String {
    #[expect(clippy::cast_possible_truncation)]
    let seconds = seconds.round() as i64;
    DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Lines over a time axis; x values are Unix timestamps in seconds.
pub(crate) fn time_series(
    path: &Path,
    caption: &str,
    y_desc: &str,
    lines: &[Line],
) -> anyhow::Result<()> {
    let area = open_area(path, SIZE)?;
    let all_points = || lines.iter().flat_map(|l| l.points.iter());
    let x_range = padded_range(all_points().map(|p| p.0));
    let y_range = padded_range(all_points().map(|p| p.1));
    let mut chart = build_chart(&area, caption, x_range, y_range)?;
    chart
        .configure_mesh()
        .x_desc("time")
        .y_desc(y_desc)
        .x_labels(6)
        .x_label_formatter(&|x| format_timestamp(*x))
        .draw()
        .map_err(plot_error)?;

    for (index, line) in lines.iter().enumerate() {
        let c = color(index);
        chart
            .draw_series(LineSeries::new(line.points.iter().copied(), c.stroke_width(2)))
            .map_err(plot_error)?
            .label(line.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], c.stroke_width(2)));
        chart
            .draw_series(line.points.iter().map(|&p| Circle::new(p, 3, c.filled())))
            .map_err(plot_error)?;
    }
    draw_legend(&mut chart)?;
    area.present().map_err(plot_error)?;
    Ok(())
}

/// Ordered sample against normal quantiles with the least-squares line.
pub(crate) fn qq_plot(
    path: &Path,
    caption: &str,
    plot: &NormalProbabilityPlot,
) -> anyhow::Result<()> {
    let area = open_area(path, SIZE)?;
    let x_range = padded_range(plot.theoretical.iter().copied());
    let fitted = [x_range.start, x_range.end].map(|z| (z, plot.line_at(z)));
    let y_range = padded_range(plot.ordered.iter().copied().chain(fitted.iter().map(|p| p.1)));
    let mut chart = build_chart(&area, caption, x_range, y_range)?;
    chart
        .configure_mesh()
        .x_desc("theoretical quantiles")
        .y_desc("ordered values")
        .draw()
        .map_err(plot_error)?;
    chart
        .draw_series(
            plot.theoretical
                .iter()
                .zip(&plot.ordered)
                .map(|(&x, &y)| Circle::new((x, y), 4, color(0).filled())),
        )
        .map_err(plot_error)?;
    chart
        .draw_series(LineSeries::new(fitted, color(3).stroke_width(2)))
        .map_err(plot_error)?
        .label(format!("fit: r = {:.4}", plot.r))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color(3).stroke_width(2)));
    draw_legend(&mut chart)?;
    area.present().map_err(plot_error)?;
    Ok(())
}

/// Post-step outline of an ECDF, starting at height 0 left of the data.
fn step_points(steps: &[(f64, f64)], x_start: f64, x_end: f64) -> Vec<(f64, f64)> {
    let mut points = vec![(x_start, 0.0)];
    let mut height = 0.0;
    for &(x, f) in steps {
        points.push((x, height));
        points.push((x, f));
        height = f;
    }
    points.push((x_end, height));
    points
}

/// Both ECDFs with the KS statistic marked where it is attained.
pub(crate) fn ecdf_comparison(
    path: &Path,
    caption: &str,
    samples: [(&str, &[(f64, f64)]); 2],
    test: &KsTest,
) -> anyhow::Result<()> {
    let area = open_area(path, SIZE)?;
    let x_range = padded_range(samples.iter().flat_map(|&(_, s)| s.iter().map(|p| p.0)));
    let mut chart = build_chart(&area, caption, x_range.clone(), -0.02..1.05)?;
    chart
        .configure_mesh()
        .x_desc("value")
        .y_desc("F(x)")
        .draw()
        .map_err(plot_error)?;

    for (index, (label, steps)) in samples.iter().enumerate() {
        let c = color(index);
        chart
            .draw_series(LineSeries::new(
                step_points(steps, x_range.start, x_range.end),
                c.stroke_width(2),
            ))
            .map_err(plot_error)?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], c.stroke_width(2)));
    }

    let location = test.location;
    let low = location.ecdf1.min(location.ecdf2);
    let high = location.ecdf1.max(location.ecdf2);
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(location.x, low), (location.x, high)],
            BLACK.stroke_width(3),
        )))
        .map_err(plot_error)?
        .label(format!("D = max|F1 - F2| = {:.4}", test.statistic))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(3)));
    draw_legend(&mut chart)?;
    area.present().map_err(plot_error)?;
    Ok(())
}

/// Predicted quantiles per category level, one line per quantile.
pub(crate) fn quantile_levels(
    path: &Path,
    caption: &str,
    (x_desc, y_desc): (&str, &str),
    levels: &[String],
    lines: &[Line],
) -> anyhow::Result<()> {
    let area = open_area(path, SIZE)?;
    let x_range = category_range(levels.len());
    let y_range = padded_range(
        lines
            .iter()
            .flat_map(|l| l.points.iter().map(|p| p.1))
            .chain([GOLDEN_RATIO]),
    );
    let mut chart = build_chart(&area, caption, x_range.clone(), y_range)?;
    let formatter = |x: &f64| category_label(levels, *x);
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_labels(levels.len() + 1)
        .x_label_formatter(&formatter)
        .disable_x_mesh()
        .draw()
        .map_err(plot_error)?;

    for (index, line) in lines.iter().enumerate() {
        let c = color(index);
        chart
            .draw_series(LineSeries::new(line.points.iter().copied(), c.stroke_width(2)))
            .map_err(plot_error)?
            .label(line.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], c.stroke_width(2)));
        chart
            .draw_series(line.points.iter().map(|&p| Circle::new(p, 6, c.filled())))
            .map_err(plot_error)?;
    }
    draw_dashed_hline(&mut chart, &x_range, GOLDEN_RATIO, color(7), "golden ratio 1.618")?;
    draw_legend(&mut chart)?;
    area.present().map_err(plot_error)?;
    Ok(())
}

/// Data scatter with fitted quantile lines over a numeric covariate.
pub(crate) fn quantile_lines(
    path: &Path,
    caption: &str,
    (x_desc, y_desc): (&str, &str),
    data: &[(f64, f64)],
    lines: &[Line],
) -> anyhow::Result<()> {
    let area = open_area(path, SIZE)?;
    let x_range = padded_range(data.iter().map(|p| p.0));
    let y_range = padded_range(
        data.iter()
            .map(|p| p.1)
            .chain(lines.iter().flat_map(|l| l.points.iter().map(|p| p.1)))
            .chain([GOLDEN_RATIO]),
    );
    let mut chart = build_chart(&area, caption, x_range.clone(), y_range)?;
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()
        .map_err(plot_error)?;
    chart
        .draw_series(
            data.iter()
                .map(|&p| Circle::new(p, 3, color(7).mix(0.4).filled())),
        )
        .map_err(plot_error)?;

    for (index, line) in lines.iter().enumerate() {
        let c = color(index);
        chart
            .draw_series(LineSeries::new(line.points.iter().copied(), c.stroke_width(3)))
            .map_err(plot_error)?
            .label(line.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], c.stroke_width(3)));
    }
    draw_dashed_hline(&mut chart, &x_range, GOLDEN_RATIO, color(7), "golden ratio 1.618")?;
    draw_legend(&mut chart)?;
    area.present().map_err(plot_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_points_outline() {
        let points = step_points(&[(1.0, 0.5), (2.0, 1.0)], 0.0, 3.0);
        assert_eq!(
            points,
            vec![
                (0.0, 0.0),
                (1.0, 0.0),
                (1.0, 0.5),
                (2.0, 0.5),
                (2.0, 1.0),
                (3.0, 1.0)
            ]
        );
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "1970-01-01 00:00");
        assert_eq!(format_timestamp(86_400.0 + 90.0), "1970-01-02 00:01");
    }
}
