//! PNG charts drawn with the `plotters` bitmap backend.
//!
//! Every chart is 1200x900 unless noted. Categorical axes are drawn on a
//! numeric `f64` axis with one unit per category and a label formatter that
//! names the integer ticks.

use std::{fmt, ops::Range, path::Path};

use plotters::{
    coord::{cartesian::Cartesian2d, types::RangedCoordf64},
    prelude::*,
};

pub(crate) mod distribution;
pub(crate) mod matrix;
pub(crate) mod xy;

pub(crate) const SIZE: (u32, u32) = (1200, 900);

pub(crate) type Area<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;
pub(crate) type Chart<'a, 'b> =
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

/// Golden ratio, drawn as a reference level on ratio charts.
pub(crate) const GOLDEN_RATIO: f64 = 1.618;

pub(crate) fn color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

pub(crate) fn plot_error<E>(err: E) -> anyhow::Error
where
    E: fmt::Display,
{
    anyhow::anyhow!("Failed to draw chart: {err}")
}

/// A white drawing area backed by a PNG file.
pub(crate) fn open_area(path: &Path, size: (u32, u32)) -> anyhow::Result<Area<'_>> {
    let area = BitMapBackend::new(path, size).into_drawing_area();
    area.fill(&WHITE).map_err(plot_error)?;
    Ok(area)
}

/// A captioned chart with labelled axes on `area`.
pub(crate) fn build_chart<'a, 'b>(
    area: &'a Area<'b>,
    caption: &str,
    x_range: Range<f64>,
    y_range: Range<f64>,
) -> anyhow::Result<Chart<'a, 'b>> {
    ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range, y_range)
        .map_err(plot_error)
}

/// Data range padded by 5% on both sides; a unit range around a single value.
pub(crate) fn padded_range<I>(values: I) -> Range<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return 0.0..1.0;
    }
    if max - min < f64::EPSILON {
        return (min - 0.5)..(max + 0.5);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

/// Axis range for `count` categories centred on `0, 1, ..`.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn category_range(count: usize) -> Range<f64> {
    -0.5..(count.max(1) as f64 - 0.5)
}

/// Label of the category at tick `x`, empty between categories.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn category_label(labels: &[String], x: f64) -> String {
    let index = x.round();
    if (x - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

/// Horizontal dashed line at `y` across `x_range`.
pub(crate) fn draw_dashed_hline(
    chart: &mut Chart<'_, '_>,
    x_range: &Range<f64>,
    y: f64,
    color: RGBColor,
    label: &str,
) -> anyhow::Result<()> {
    const DASHES: u32 = 40;
    let step = (x_range.end - x_range.start) / f64::from(DASHES);
    chart
        .draw_series((0..DASHES).step_by(2).map(|i| {
            let x0 = x_range.start + f64::from(i) * step;
            PathElement::new(vec![(x0, y), (x0 + step, y)], color.stroke_width(2))
        }))
        .map_err(plot_error)?
        .label(label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    Ok(())
}

pub(crate) fn draw_legend<'a, 'b: 'a>(chart: &mut Chart<'a, 'b>) -> anyhow::Result<()> {
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(("sans-serif", 20))
        .draw()
        .map_err(plot_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_range() {
        let range = padded_range([1.0, 3.0, f64::NAN]);
        assert!((range.start - 0.9).abs() < 1e-12);
        assert!((range.end - 3.1).abs() < 1e-12);
        assert_eq!(padded_range([2.0, 2.0]), 1.5..2.5);
        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);
    }

    #[test]
    fn test_category_labels() {
        let labels = vec!["0-10".to_owned(), "10-20".to_owned()];
        assert_eq!(category_range(2), -0.5..1.5);
        assert_eq!(category_label(&labels, 1.0), "10-20");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 2.0), "");
        assert_eq!(category_label(&labels, -1.0), "");
    }

    #[test]
    #[ignore = "requires system fonts for chart text"]
    fn test_legend_with_dashed_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legend.png");
        {
            let area = open_area(&path, (400, 300)).unwrap();
            {
                let mut chart = build_chart(&area, "legend", 0.0..1.0, 0.0..2.0).unwrap();
                draw_dashed_hline(&mut chart, &(0.0..1.0), GOLDEN_RATIO, color(0), "golden ratio")
                    .unwrap();
                draw_legend(&mut chart).unwrap();
            }
            area.present().unwrap();
        }
        assert!(path.exists());
    }
}
