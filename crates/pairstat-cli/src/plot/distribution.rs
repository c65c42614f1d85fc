//! Histograms, box plots and violin plots.

use std::path::Path;

use pairstat_stats::{
    descriptive, histogram::Histogram, kde::GaussianKde, quantiles, summary::BoxSummary,
};
use plotters::prelude::*;

use super::{
    SIZE, build_chart, category_label, category_range, color, draw_legend, open_area,
    padded_range, plot_error,
};

const KDE_POINTS: usize = 200;
const HALF_WIDTH: f64 = 0.35;

/// A labelled sample shown as one box or violin.
#[derive(Debug, Clone)]
pub(crate) struct Group {
    pub label: String,
    pub values: Vec<f64>,
}

/// Density histogram with a KDE curve when one can be fitted.
pub(crate) fn histogram_kde(
    path: &Path,
    caption: &str,
    x_desc: &str,
    values: &[f64],
    num_bins: usize,
) -> anyhow::Result<()> {
    let histogram = Histogram::new(values.iter().copied(), num_bins);
    let kde = GaussianKde::new(values).ok();
    let curve = kde.as_ref().map_or_else(Vec::new, |kde| {
        let (start, end) = kde.support();
        kde.evaluate_grid(start, end, KDE_POINTS)
    });

    let area = open_area(path, SIZE)?;
    let x_range = padded_range(
        histogram
            .bins
            .iter()
            .flat_map(|b| [b.range.start, b.range.end])
            .chain(curve.iter().map(|p| p.0)),
    );
    let y_max = curve
        .iter()
        .map(|p| p.1)
        .fold(histogram.max_density(), f64::max);
    let y_top = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };
    let mut chart = build_chart(&area, caption, x_range, 0.0..y_top)?;
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("density")
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(histogram.bins.iter().map(|bin| {
            Rectangle::new(
                [
                    (bin.range.start, 0.0),
                    (bin.range.end, bin.density(histogram.total)),
                ],
                color(0).mix(0.5).filled(),
            )
        }))
        .map_err(plot_error)?
        .label("histogram")
        .legend(|(x, y)| {
            Rectangle::new([(x, y - 5), (x + 20, y + 5)], color(0).mix(0.5).filled())
        });

    if !curve.is_empty() {
        chart
            .draw_series(LineSeries::new(curve, color(3).stroke_width(2)))
            .map_err(plot_error)?
            .label("KDE")
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color(3).stroke_width(2))
            });
    }
    draw_legend(&mut chart)?;
    area.present().map_err(plot_error)?;
    Ok(())
}

fn labels(groups: &[Group]) -> Vec<String> {
    groups.iter().map(|g| g.label.clone()).collect()
}

/// Box plot per group with 1.5 IQR whiskers and fliers.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn box_plot(
    path: &Path,
    caption: &str,
    (x_desc, y_desc): (&str, &str),
    groups: &[Group],
) -> anyhow::Result<()> {
    let area = open_area(path, SIZE)?;
    let labels = labels(groups);
    let y_range = padded_range(groups.iter().flat_map(|g| g.values.iter().copied()));
    let mut chart = build_chart(&area, caption, category_range(groups.len()), y_range)?;
    let formatter = |x: &f64| category_label(&labels, *x);
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_labels(groups.len() + 1)
        .x_label_formatter(&formatter)
        .disable_x_mesh()
        .draw()
        .map_err(plot_error)?;

    for (index, group) in groups.iter().enumerate() {
        let Some(summary) = BoxSummary::new(&group.values) else {
            continue;
        };
        let x = index as f64;
        let (left, right) = (x - HALF_WIDTH, x + HALF_WIDTH);
        let fences = summary.fences;

        let box_corners = [(left, fences.q1), (right, fences.q3)];
        chart
            .draw_series([
                Rectangle::new(box_corners, color(index).mix(0.5).filled()),
                Rectangle::new(box_corners, BLACK.stroke_width(1)),
            ])
            .map_err(plot_error)?;

        let (cap_left, cap_right) = (x - HALF_WIDTH / 2.0, x + HALF_WIDTH / 2.0);
        let segments = [
            [(left, summary.median), (right, summary.median)],
            [(x, fences.q3), (x, summary.whisker_high)],
            [(x, fences.q1), (x, summary.whisker_low)],
            [(cap_left, summary.whisker_high), (cap_right, summary.whisker_high)],
            [(cap_left, summary.whisker_low), (cap_right, summary.whisker_low)],
        ];
        chart
            .draw_series(segments.iter().enumerate().map(|(i, segment)| {
                let width = if i == 0 { 2 } else { 1 };
                PathElement::new(segment.to_vec(), BLACK.stroke_width(width))
            }))
            .map_err(plot_error)?;
        chart
            .draw_series(
                summary
                    .fliers
                    .iter()
                    .map(|&y| Circle::new((x, y), 4, BLACK.stroke_width(1))),
            )
            .map_err(plot_error)?;
    }
    area.present().map_err(plot_error)?;
    Ok(())
}

/// Outline of a mirrored density around `center`, scaled to `max_half_width`.
fn violin_outline(kde: &GaussianKde, center: f64, max_half_width: f64) -> Vec<(f64, f64)> {
    let (start, end) = kde.support();
    let curve = kde.evaluate_grid(start, end, KDE_POINTS);
    let peak = curve.iter().map(|p| p.1).fold(0.0, f64::max);
    if peak <= 0.0 {
        return vec![];
    }
    let scale = max_half_width / peak;
    let right = curve.iter().map(|&(y, d)| (center + d * scale, y));
    let left = curve.iter().rev().map(|&(y, d)| (center - d * scale, y));
    right.chain(left).collect()
}

/// Violin per group with median (line) and mean (triangle) marks.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn violin_plot(
    path: &Path,
    caption: &str,
    (x_desc, y_desc): (&str, &str),
    groups: &[Group],
) -> anyhow::Result<()> {
    let outlines = groups
        .iter()
        .enumerate()
        .map(|(index, group)| {
            GaussianKde::new(&group.values)
                .map(|kde| violin_outline(&kde, index as f64, HALF_WIDTH))
                .unwrap_or_default()
        })
        .collect::<Vec<_>>();

    let area = open_area(path, SIZE)?;
    let labels = labels(groups);
    let y_range = padded_range(
        outlines
            .iter()
            .flat_map(|o| o.iter().map(|p| p.1))
            .chain(groups.iter().flat_map(|g| g.values.iter().copied())),
    );
    let mut chart = build_chart(&area, caption, category_range(groups.len()), y_range)?;
    let formatter = |x: &f64| category_label(&labels, *x);
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .x_labels(groups.len() + 1)
        .x_label_formatter(&formatter)
        .disable_x_mesh()
        .draw()
        .map_err(plot_error)?;

    for (index, (group, outline)) in groups.iter().zip(&outlines).enumerate() {
        let x = index as f64;
        let c = color(index);
        if outline.is_empty() {
            // No density without spread: show the raw points instead
            chart
                .draw_series(
                    group
                        .values
                        .iter()
                        .map(|&y| Circle::new((x, y), 4, c.filled())),
                )
                .map_err(plot_error)?;
        } else {
            chart
                .draw_series(std::iter::once(Polygon::new(
                    outline.clone(),
                    c.mix(0.5).filled(),
                )))
                .map_err(plot_error)?;
            chart
                .draw_series(std::iter::once(PathElement::new(
                    outline.clone(),
                    BLACK.stroke_width(1),
                )))
                .map_err(plot_error)?;
        }

        let median = quantiles::median(&group.values);
        if median.is_finite() {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(x - HALF_WIDTH / 2.0, median), (x + HALF_WIDTH / 2.0, median)],
                    BLACK.stroke_width(3),
                )))
                .map_err(plot_error)?;
        }
        if let Some(mean) = descriptive::mean(&group.values) {
            chart
                .draw_series(std::iter::once(TriangleMarker::new(
                    (x, mean),
                    8,
                    WHITE.filled(),
                )))
                .map_err(plot_error)?;
        }
    }

    // Legend entries for the marks
    chart
        .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())
        .map_err(plot_error)?
        .label("median")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(3)));
    chart
        .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())
        .map_err(plot_error)?
        .label("mean")
        .legend(|(x, y)| TriangleMarker::new((x + 10, y), 8, BLACK.filled()));
    draw_legend(&mut chart)?;
    area.present().map_err(plot_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violin_outline_is_mirrored() {
        let kde = GaussianKde::new(&[1.0, 2.0, 2.5, 3.0, 4.0]).unwrap();
        let outline = violin_outline(&kde, 2.0, 0.4);
        assert_eq!(outline.len(), 2 * KDE_POINTS);
        let widest = outline.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        assert!((widest - 2.4).abs() < 1e-12);
        let (first, last) = (outline[0], outline[outline.len() - 1]);
        assert!((first.1 - last.1).abs() < 1e-12);
        assert!((first.0 - 2.0 + (last.0 - 2.0)).abs() < 1e-12);
    }
}
