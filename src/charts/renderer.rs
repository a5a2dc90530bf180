//! Static Chart Renderer
//! Renders charts to SVG with plotters and opens them in the system viewer
//! (the browser on most desktops).
//!
//! Layout follows the embedded charts: caption on top, axis descriptions
//! from the chart labels, categorical axes labelled by position.

use crate::charts::{ChartData, ChartError, ChartKind, ChartPlotter, ChartSeries, PALETTE};
use plotters::chart::ChartBuilder as PlotBuilder;
use plotters::prelude::{
    Circle, Color, IntoDrawingArea, IntoFont, LineSeries, Pie, RGBColor, Rectangle, SVGBackend,
    Text, BLACK, WHITE,
};
use std::path::{Path, PathBuf};
use tracing::info;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 640;
const FONT: &str = "sans-serif";

fn render_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Render(e.to_string())
}

fn rgb(index: usize) -> RGBColor {
    let c = PALETTE[index % PALETTE.len()];
    RGBColor(c.r(), c.g(), c.b())
}

/// Padded (min, max) over values; degenerate ranges are widened by one.
pub fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return (0.0, 1.0);
    }
    if min == max {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

fn label_at(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if idx >= 0.0 && (idx - x).abs() < 1e-6 {
        labels.get(idx as usize).cloned().unwrap_or_default()
    } else {
        String::new()
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Temp-directory path used for a chart's SVG file.
    pub fn temp_path(chart: &ChartData) -> PathBuf {
        std::env::temp_dir().join(format!(
            "data_explorer_chart_{}_{}.svg",
            std::process::id(),
            chart.id
        ))
    }

    /// Render the chart to an SVG file and open it with the default viewer.
    pub fn open_in_browser(chart: &ChartData) -> Result<PathBuf, ChartError> {
        let path = Self::temp_path(chart);
        Self::render_svg(chart, &path)?;
        open::that(&path)?;
        info!("Opened chart '{}' at {}", chart.title, path.display());
        Ok(path)
    }

    /// Render a chart to an SVG file.
    pub fn render_svg(chart: &ChartData, path: &Path) -> Result<(), ChartError> {
        match &chart.series {
            ChartSeries::Xy { points, x_labels } => {
                Self::render_xy(chart, points, x_labels.as_deref(), path)
            }
            ChartSeries::Categories { labels, counts } if chart.kind == ChartKind::Pie => {
                Self::render_pie(chart, labels, counts, path)
            }
            ChartSeries::Categories { labels, counts } => {
                Self::render_bars(chart, labels, counts, path)
            }
            ChartSeries::Histogram { bins } => {
                let bars: Vec<(f64, f64, f64)> = bins
                    .iter()
                    .map(|b| (b.start, b.end, b.count as f64))
                    .collect();
                Self::render_rects(chart, &bars, None, path)
            }
            ChartSeries::Heatmap { names, matrix } => {
                Self::render_heatmap(chart, names, matrix, path)
            }
        }
    }

    fn render_xy(
        chart: &ChartData,
        points: &[[f64; 2]],
        x_labels: Option<&[String]>,
        path: &Path,
    ) -> Result<(), ChartError> {
        let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let (x_min, x_max) = padded_range(points.iter().map(|p| p[0]));
        let (y_min, y_max) = padded_range(points.iter().map(|p| p[1]));

        let mut plot = PlotBuilder::on(&root)
            .caption(&chart.title, (FONT, 24).into_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(render_err)?;

        let formatter = |x: &f64| match x_labels {
            Some(labels) => label_at(labels, *x),
            None if chart.time_x => ChartPlotter::format_timestamp(*x),
            None => format!("{:.2}", x),
        };

        plot.configure_mesh()
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .x_label_formatter(&formatter)
            .draw()
            .map_err(render_err)?;

        let color = rgb(0);
        if chart.kind != ChartKind::Scatter {
            plot.draw_series(LineSeries::new(
                points.iter().map(|p| (p[0], p[1])),
                color.stroke_width(2),
            ))
            .map_err(render_err)?;
        }
        plot.draw_series(
            points
                .iter()
                .map(|p| Circle::new((p[0], p[1]), 3, color.mix(0.7).filled())),
        )
        .map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(())
    }

    fn render_bars(
        chart: &ChartData,
        labels: &[String],
        counts: &[f64],
        path: &Path,
    ) -> Result<(), ChartError> {
        let bars: Vec<(f64, f64, f64)> = counts
            .iter()
            .enumerate()
            .map(|(i, &c)| (i as f64 - 0.35, i as f64 + 0.35, c))
            .collect();
        Self::render_rects(chart, &bars, Some(labels), path)
    }

    /// Draw (start, end, height) rectangles on a shared axis.
    fn render_rects(
        chart: &ChartData,
        bars: &[(f64, f64, f64)],
        labels: Option<&[String]>,
        path: &Path,
    ) -> Result<(), ChartError> {
        let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let (x_min, x_max) = match labels {
            Some(labels) => (-0.6, labels.len() as f64 - 0.4),
            None => padded_range(bars.iter().flat_map(|b| [b.0, b.1])),
        };
        let y_max = bars.iter().map(|b| b.2).fold(0.0, f64::max).max(1.0) * 1.1;

        let mut plot = PlotBuilder::on(&root)
            .caption(&chart.title, (FONT, 24).into_font())
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)
            .map_err(render_err)?;

        let formatter = |x: &f64| match labels {
            Some(labels) => label_at(labels, *x),
            None => format!("{:.2}", x),
        };

        let mut mesh = plot.configure_mesh();
        mesh.x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .x_label_formatter(&formatter);
        if let Some(labels) = labels {
            mesh.x_labels(labels.len().max(1));
        }
        mesh.draw().map_err(render_err)?;

        let fill = rgb(0);
        plot.draw_series(bars.iter().map(|&(start, end, height)| {
            Rectangle::new([(start, 0.0), (end, height)], fill.mix(0.8).filled())
        }))
        .map_err(render_err)?;
        plot.draw_series(bars.iter().map(|&(start, end, height)| {
            Rectangle::new([(start, 0.0), (end, height)], BLACK.stroke_width(1))
        }))
        .map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(())
    }

    fn render_pie(
        chart: &ChartData,
        labels: &[String],
        counts: &[f64],
        path: &Path,
    ) -> Result<(), ChartError> {
        let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let root = root
            .titled(&chart.title, (FONT, 24).into_font())
            .map_err(render_err)?;

        let (w, h) = root.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = (w.min(h) as f64) * 0.38;
        let colors: Vec<RGBColor> = (0..counts.len()).map(rgb).collect();

        let mut pie = Pie::new(&center, &radius, counts, &colors, labels);
        pie.label_style((FONT, 16).into_font());
        pie.percentages((FONT, 14).into_font().color(&WHITE));
        root.draw(&pie).map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(())
    }

    fn render_heatmap(
        chart: &ChartData,
        names: &[String],
        matrix: &[Vec<f64>],
        path: &Path,
    ) -> Result<(), ChartError> {
        let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let n = names.len() as f64;
        // One extra row and column hold the names.
        let mut plot = PlotBuilder::on(&root)
            .caption(&chart.title, (FONT, 24).into_font())
            .margin(20)
            .build_cartesian_2d(-1.5..n, 0.0..n + 1.0)
            .map_err(render_err)?;

        plot.configure_mesh()
            .disable_mesh()
            .disable_axes()
            .draw()
            .map_err(render_err)?;

        let cells = matrix.iter().enumerate().flat_map(|(i, row)| {
            row.iter().enumerate().map(move |(j, &v)| (i, j, v))
        });

        plot.draw_series(cells.clone().map(|(i, j, v)| {
            let c = ChartPlotter::diverging_color(v);
            let y = n - 1.0 - i as f64;
            Rectangle::new(
                [(j as f64, y), (j as f64 + 1.0, y + 1.0)],
                RGBColor(c.r(), c.g(), c.b()).filled(),
            )
        }))
        .map_err(render_err)?;

        plot.draw_series(cells.map(|(i, j, v)| {
            let y = n - 1.0 - i as f64;
            Text::new(
                format!("{:.2}", v),
                (j as f64 + 0.3, y + 0.6),
                (FONT, 14).into_font(),
            )
        }))
        .map_err(render_err)?;

        plot.draw_series(names.iter().enumerate().flat_map(|(k, name)| {
            [
                Text::new(name.clone(), (k as f64 + 0.1, n + 0.6), (FONT, 14).into_font()),
                Text::new(
                    name.clone(),
                    (-1.4, n - 1.0 - k as f64 + 0.6),
                    (FONT, 14).into_font(),
                ),
            ]
        }))
        .map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartBuilder;
    use polars::prelude::*;
    use tempfile::TempDir;

    fn weather() -> DataFrame {
        DataFrame::new(vec![
            Column::new("city".into(), vec!["Oslo", "Rome", "Oslo", "Lima", "Rome"]),
            Column::new("temp".into(), vec![1.0, 20.0, 3.0, 18.0, 22.0]),
            Column::new("rain".into(), vec![30.0, 5.0, 28.0, 1.0, 4.0]),
        ])
        .unwrap()
    }

    fn assert_renders(chart: &ChartData, dir: &TempDir, name: &str) {
        let path = dir.path().join(name);
        StaticChartRenderer::render_svg(chart, &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"), "{} did not produce an svg", name);
    }

    #[test]
    fn renders_every_chart_kind() {
        let df = weather();
        let dir = TempDir::new().unwrap();
        for kind in ChartKind::ALL {
            let y_col = match kind {
                ChartKind::Bar | ChartKind::Pie => "city",
                _ => "rain",
            };
            let chart = ChartBuilder::build(&df, kind, "temp", y_col).unwrap();
            assert_renders(&chart, &dir, &format!("{}.svg", kind.label()));
        }

        let by_city = ChartBuilder::build(&df, ChartKind::Line, "city", "temp").unwrap();
        assert_renders(&by_city, &dir, "labelled_line.svg");
    }

    #[test]
    fn renders_empty_categories() {
        let dir = TempDir::new().unwrap();
        for kind in [ChartKind::Pie, ChartKind::Bar] {
            let chart = ChartData::new(
                kind,
                "empty",
                "",
                "",
                ChartSeries::Categories { labels: vec![], counts: vec![] },
            );
            assert_renders(&chart, &dir, &format!("empty_{}.svg", kind.label()));
        }
    }

    #[test]
    fn temp_path_is_unique_per_chart() {
        let a = ChartData::new(
            ChartKind::Bar,
            "a",
            "",
            "",
            ChartSeries::Categories { labels: vec![], counts: vec![] },
        );
        let b = ChartData::new(
            ChartKind::Bar,
            "b",
            "",
            "",
            ChartSeries::Categories { labels: vec![], counts: vec![] },
        );
        let pa = StaticChartRenderer::temp_path(&a);
        assert_ne!(pa, StaticChartRenderer::temp_path(&b));
        assert_eq!(pa.extension().unwrap(), "svg");
    }

    #[test]
    fn padded_range_handles_edge_cases() {
        assert_eq!(padded_range([].into_iter()), (0.0, 1.0));
        assert_eq!(padded_range([2.0, 2.0].into_iter()), (1.0, 3.0));
        let (lo, hi) = padded_range([0.0, 10.0].into_iter());
        assert!(lo < 0.0 && hi > 10.0);
    }

    #[test]
    fn label_lookup_only_on_integer_ticks() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(label_at(&labels, 1.0), "b");
        assert_eq!(label_at(&labels, 0.5), "");
        assert_eq!(label_at(&labels, 5.0), "");
    }
}
