use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::cli::ImageFormat;
use crate::figure::{Figure, Series};
use crate::style::{LineStyle, Marker};

const FIGURE_SIZE: (u32, u32) = (960, 720);
/// Share of the image height given to the axes; the rest holds the legend.
const AXES_SHARE: f64 = 0.75;
const LEGEND_COLUMNS: usize = 3;
const LINE_ALPHA: f64 = 0.7;
const GRID: RGBColor = RGBColor(225, 225, 225);

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Write `figure` to `<out_dir>/<file_stem>.<ext>` and return the path.
pub fn export_figure(figure: &Figure, out_dir: &Path, format: ImageFormat) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    let path = out_dir.join(format!("{}.{}", figure.spec.file_stem, format.extension()));

    match format {
        ImageFormat::Svg => {
            let root = SVGBackend::new(&path, FIGURE_SIZE).into_drawing_area();
            draw_figure(&root, figure)
                .with_context(|| format!("drawing {}", figure.spec.file_stem))?;
            root.present()
                .with_context(|| format!("writing {}", path.display()))?;
        }
        ImageFormat::Png => {
            let root = BitMapBackend::new(&path, FIGURE_SIZE).into_drawing_area();
            draw_figure(&root, figure)
                .with_context(|| format!("drawing {}", figure.spec.file_stem))?;
            root.present()
                .with_context(|| format!("writing {}", path.display()))?;
        }
    }

    log::info!("Saved {}", path.display());
    Ok(path)
}

/// Export every figure, returning the written paths in order.
pub fn export_all(figures: &[Figure], out_dir: &Path, format: ImageFormat) -> Result<Vec<PathBuf>> {
    figures
        .iter()
        .map(|f| export_figure(f, out_dir, format))
        .collect()
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

/// Axis ranges around the data: 0.5 on each side in x (one sweep step),
/// 10 % of the span in y. Degenerate or empty data gets a unit range.
pub fn axis_ranges(figure: &Figure) -> (Range<f64>, Range<f64>) {
    let Some((x0, x1, y0, y1)) = figure.bounds() else {
        return (0.0..1.0, 0.0..1.0);
    };
    let x_pad = 0.5 * figure.spec.x_step.abs().max(f64::EPSILON);
    let y_span = y1 - y0;
    let y_pad = if y_span > f64::EPSILON {
        0.1 * y_span
    } else {
        0.5 * y0.abs().max(1.0)
    };
    ((x0 - x_pad)..(x1 + x_pad), (y0 - y_pad)..(y1 + y_pad))
}

fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let (_, height) = root.dim_in_pixel();
    let (upper, lower) = root.split_vertically((f64::from(height) * AXES_SHARE) as u32);

    let (x_range, y_range) = axis_ranges(figure);
    let mut chart = ChartBuilder::on(&upper)
        .caption(&figure.spec.title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(65)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(&figure.spec.x_label)
        .y_desc(&figure.spec.y_label)
        .axis_desc_style(("sans-serif", 16))
        .bold_line_style(GRID)
        .light_line_style(TRANSPARENT)
        .x_label_formatter(&|x| format!("{x:.0}"))
        .y_label_formatter(&|y| format!("{y:.2}"))
        .draw()?;

    for series in &figure.series {
        let color = series.style.color.to_plotters();
        if series.draw_line && series.points.len() > 1 {
            let line = color.mix(LINE_ALPHA).stroke_width(2);
            match series.style.line_style {
                LineStyle::Solid => {
                    chart.draw_series(LineSeries::new(series.points.iter().copied(), line))?;
                }
                LineStyle::Dashed => {
                    chart.draw_series(DashedLineSeries::new(
                        series.points.iter().copied(),
                        8,
                        5,
                        line,
                    ))?;
                }
            }
        }

        draw_markers(&mut chart, series, figure.spec.marker_size as i32)?;
    }

    draw_legend(&lower, &figure.series, figure.spec.marker_size as i32)
}

/// Frameless legend in `LEGEND_COLUMNS` columns, centred under the axes.
fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    series: &[Series],
    marker_size: i32,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    if series.is_empty() {
        return Ok(());
    }
    let (width, _) = area.dim_in_pixel();
    let columns = LEGEND_COLUMNS.min(series.len());
    let column_width = 200i32;
    let row_height = 32i32;
    let left = (width as i32 - column_width * columns as i32) / 2;
    let top = 30i32;

    for (i, s) in series.iter().enumerate() {
        let x = left + (i % columns) as i32 * column_width;
        let y = top + (i / columns) as i32 * row_height;
        let color = s.style.color.to_plotters();

        area.draw(&PathElement::new(
            vec![(x, y), (x + 30, y)],
            color.mix(LINE_ALPHA).stroke_width(2),
        ))?;
        draw_legend_marker(area, s.style.marker, (x + 15, y), marker_size + 1, color.filled())?;
        area.draw(&Text::new(
            s.style.name.clone(),
            (x + 40, y - 8),
            ("sans-serif", 16).into_font(),
        ))?;
    }
    Ok(())
}

type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Markers of one series; `size` is the radius in pixels.
fn draw_markers<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    series: &Series,
    size: i32,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let style = series.style.color.to_plotters().filled();
    let points = series.points.iter().copied();
    match series.style.marker {
        Marker::Circle => {
            chart.draw_series(points.map(|p| Circle::new(p, size, style)))?;
        }
        Marker::Cross => {
            chart.draw_series(points.map(|p| Cross::new(p, size, style.stroke_width(3))))?;
        }
        Marker::Square => {
            chart.draw_series(points.map(|p| {
                EmptyElement::at(p) + Rectangle::new([(-size, -size), (size, size)], style)
            }))?;
        }
        Marker::Diamond | Marker::Star => {
            let outline = polygon_vertices(series.style.marker, size);
            chart.draw_series(
                points.map(|p| EmptyElement::at(p) + Polygon::new(outline.clone(), style)),
            )?;
        }
    }
    Ok(())
}

/// One legend marker centred on the pixel `(x, y)`.
fn draw_legend_marker<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    marker: Marker,
    (x, y): (i32, i32),
    size: i32,
    style: ShapeStyle,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    match marker {
        Marker::Circle => area.draw(&Circle::new((x, y), size, style)),
        Marker::Cross => area.draw(&Cross::new((x, y), size, style.stroke_width(3))),
        Marker::Square => area.draw(&Rectangle::new(
            [(x - size, y - size), (x + size, y + size)],
            style,
        )),
        Marker::Diamond | Marker::Star => {
            let outline: Vec<(i32, i32)> = polygon_vertices(marker, size)
                .into_iter()
                .map(|(dx, dy)| (x + dx, y + dy))
                .collect();
            area.draw(&Polygon::new(outline, style))
        }
    }
}

/// Pixel offsets of the polygon markers around their centre. Other markers
/// have no outline.
fn polygon_vertices(marker: Marker, size: i32) -> Vec<(i32, i32)> {
    match marker {
        Marker::Diamond => {
            let w = (size * 3) / 4;
            vec![(0, -size - 1), (w, 0), (0, size + 1), (-w, 0)]
        }
        Marker::Star => star_vertices(size + 2),
        Marker::Circle | Marker::Cross | Marker::Square => Vec::new(),
    }
}

/// Five-pointed star, first point straight up.
fn star_vertices(radius: i32) -> Vec<(i32, i32)> {
    let outer = f64::from(radius);
    let inner = outer * 0.45;
    (0..10)
        .map(|k| {
            let r = if k % 2 == 0 { outer } else { inner };
            let angle = std::f64::consts::PI * (k as f64) / 5.0 - std::f64::consts::FRAC_PI_2;
            ((r * angle.cos()).round() as i32, (r * angle.sin()).round() as i32)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{MetricSeries, ResultsSet};
    use crate::figure::{build_figure, default_figures};
    use crate::style::StyleSheet;

    fn noise_figure() -> Figure {
        let mut rs = ResultsSet::new();
        rs.insert(
            "2d_5r_noised_prior",
            "imesa",
            "iate_trans",
            MetricSeries::Values(vec![0.4, 0.5, 0.3, 0.2]),
        );
        rs.insert(
            "2d_5r_noised_prior",
            "imesa",
            "statuses",
            MetricSeries::Flags(vec![true, true, false, true, false, true]),
        );
        rs.insert(
            "2d_5r_noised_prior",
            "raido",
            "iate_trans",
            MetricSeries::Values(vec![0.6, 0.6, 0.6]),
        );
        build_figure(&rs, &default_figures()[0], &StyleSheet::default())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn ranges_pad_data() {
        let fig = noise_figure();
        let (x, y) = axis_ranges(&fig);
        assert_eq!(x, 4.5..6.5);
        assert!(y.start < 0.25 && y.end > 0.6);
    }

    #[test]
    fn empty_figure_gets_unit_ranges() {
        let mut fig = noise_figure();
        fig.series.clear();
        assert_eq!(axis_ranges(&fig), (0.0..1.0, 0.0..1.0));
    }

    #[test]
    fn flat_data_still_gets_a_y_span() {
        let mut fig = noise_figure();
        fig.series.truncate(1);
        fig.series[0].points = vec![(5.0, 2.0), (6.0, 2.0)];
        let (_, y) = axis_ranges(&fig);
        assert!(y.start < 2.0 && y.end > 2.0);
    }

    #[test]
    fn star_has_ten_vertices_with_top_point() {
        let v = star_vertices(10);
        assert_eq!(v.len(), 10);
        assert_eq!(v[0], (0, -10));
    }

    #[test]
    fn polygon_markers_have_outlines() {
        assert_eq!(polygon_vertices(Marker::Diamond, 4), vec![(0, -5), (3, 0), (0, 5), (-3, 0)]);
        assert_eq!(polygon_vertices(Marker::Star, 8).len(), 10);
        assert!(polygon_vertices(Marker::Circle, 8).is_empty());
    }

    #[test]
    fn exports_svg_with_title_and_legend() {
        let dir = std::env::temp_dir().join(format!("imesa-plots-render-{}", std::process::id()));
        let fig = noise_figure();
        let path = export_figure(&fig, &dir, ImageFormat::Svg).unwrap();
        assert_eq!(path.file_name().unwrap(), "iate_noise.svg");

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("iATE vs. Noise of initialization."));
        assert!(svg.contains("iMESA"));
        assert!(svg.contains("RaiDO"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
