//! Grids over column pairs: correlation heat maps and pair plots.

use std::path::Path;

use pairstat_stats::{correlation::CorrelationMatrix, histogram::Histogram};
use plotters::{
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};

use super::{
    SIZE, build_chart, category_label, category_range, color, open_area, padded_range, plot_error,
};

const PAIR_BINS: usize = 20;

/// Maps a coefficient in `[-1, 1]` onto blue, white and red.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn diverging_color(r: f64) -> RGBColor {
    if !r.is_finite() {
        return RGBColor(200, 200, 200);
    }
    let r = r.clamp(-1.0, 1.0);
    let (blue, red) = ((59.0, 76.0, 192.0), (180.0, 4.0, 38.0));
    let target = if r < 0.0 { blue } else { red };
    let t = r.abs();
    let mix = |end: f64| (255.0 + (end - 255.0) * t).round() as u8;
    RGBColor(mix(target.0), mix(target.1), mix(target.2))
}

/// Correlation matrix as coloured cells annotated with their coefficients.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn heatmap(path: &Path, caption: &str, matrix: &CorrelationMatrix) -> anyhow::Result<()> {
    anyhow::ensure!(!matrix.is_empty(), "No columns to correlate");
    let k = matrix.len();
    let area = open_area(path, SIZE)?;
    let x_labels = matrix.names.clone();
    // Row 0 is drawn at the top
    let y_labels = matrix.names.iter().rev().cloned().collect::<Vec<_>>();
    let mut chart = build_chart(&area, caption, category_range(k), category_range(k))?;
    let x_formatter = |x: &f64| category_label(&x_labels, *x);
    let y_formatter = |y: &f64| category_label(&y_labels, *y);
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(k + 1)
        .y_labels(k + 1)
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter)
        .label_style(("sans-serif", 22))
        .draw()
        .map_err(plot_error)?;

    let text_style = TextStyle::from(("sans-serif", 26).into_font())
        .pos(Pos::new(HPos::Center, VPos::Center));
    for row in 0..k {
        for col in 0..k {
            let r = matrix.get(row, col).unwrap_or(f64::NAN);
            let (x, y) = (col as f64, (k - 1 - row) as f64);
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                    diverging_color(r).filled(),
                )))
                .map_err(plot_error)?;
            let text = if r.is_finite() {
                format!("{r:.2}")
            } else {
                "n/a".to_owned()
            };
            chart
                .draw_series(std::iter::once(Text::new(text, (x, y), text_style.clone())))
                .map_err(plot_error)?;
        }
    }
    area.present().map_err(plot_error)?;
    Ok(())
}

/// Grid of histograms (diagonal) and pairwise scatter plots.
///
/// `columns` holds one value per row with NaN for missing cells, so scatter
/// panels use the rows complete for their pair.
pub(crate) fn pair_plot(
    path: &Path,
    caption: &str,
    names: &[String],
    columns: &[Vec<f64>],
) -> anyhow::Result<()> {
    let k = columns.len();
    let side = 350 * u32::try_from(k)?;
    let root = open_area(path, (side, side + 60))?;
    let root = root.titled(caption, ("sans-serif", 30)).map_err(plot_error)?;
    let panels = root.split_evenly((k, k));

    for (index, panel) in panels.iter().enumerate() {
        let (row, col) = (index / k, index % k);
        let x_range = padded_range(columns[col].iter().copied());
        let x_desc = if row + 1 == k { names[col].as_str() } else { "" };
        let y_desc = if col == 0 { names[row].as_str() } else { "" };

        if row == col {
            let histogram = Histogram::new(columns[col].iter().copied(), PAIR_BINS);
            let y_top = histogram.max_density().max(f64::MIN_POSITIVE) * 1.1;
            let mut chart = ChartBuilder::on(panel)
                .margin(8)
                .x_label_area_size(35)
                .y_label_area_size(50)
                .build_cartesian_2d(x_range, 0.0..y_top)
                .map_err(plot_error)?;
            chart
                .configure_mesh()
                .x_labels(4)
                .y_labels(4)
                .x_desc(x_desc)
                .y_desc(y_desc)
                .draw()
                .map_err(plot_error)?;
            chart
                .draw_series(histogram.bins.iter().map(|bin| {
                    Rectangle::new(
                        [
                            (bin.range.start, 0.0),
                            (bin.range.end, bin.density(histogram.total)),
                        ],
                        color(0).mix(0.6).filled(),
                    )
                }))
                .map_err(plot_error)?;
        } else {
            let points = columns[col]
                .iter()
                .zip(&columns[row])
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .map(|(&x, &y)| (x, y))
                .collect::<Vec<_>>();
            let y_range = padded_range(columns[row].iter().copied());
            let mut chart = ChartBuilder::on(panel)
                .margin(8)
                .x_label_area_size(35)
                .y_label_area_size(50)
                .build_cartesian_2d(x_range, y_range)
                .map_err(plot_error)?;
            chart
                .configure_mesh()
                .x_labels(4)
                .y_labels(4)
                .x_desc(x_desc)
                .y_desc(y_desc)
                .draw()
                .map_err(plot_error)?;
            chart
                .draw_series(
                    points
                        .iter()
                        .map(|&p| Circle::new(p, 2, color(0).mix(0.5).filled())),
                )
                .map_err(plot_error)?;
        }
    }
    root.present().map_err(plot_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diverging_color_endpoints() {
        assert_eq!(diverging_color(0.0), RGBColor(255, 255, 255));
        assert_eq!(diverging_color(1.0), RGBColor(180, 4, 38));
        assert_eq!(diverging_color(-2.0), RGBColor(59, 76, 192));
        assert_eq!(diverging_color(f64::NAN), RGBColor(200, 200, 200));
    }

    #[test]
    fn test_heatmap_needs_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corr.png");
        let matrix = CorrelationMatrix::new(vec![], &[]);
        assert!(heatmap(&path, "empty", &matrix).is_err());
        assert!(!path.exists());
    }
}
