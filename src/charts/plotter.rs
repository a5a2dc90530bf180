//! Chart Plotter Module
//! Draws interactive charts inside the window using egui_plot.

use crate::charts::{ChartData, ChartKind, ChartSeries};
use chrono::DateTime;
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text};

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(37, 99, 235),   // Blue
    Color32::from_rgb(16, 185, 129),  // Green
    Color32::from_rgb(245, 158, 11),  // Amber
    Color32::from_rgb(239, 68, 68),   // Red
    Color32::from_rgb(139, 92, 246),  // Violet
    Color32::from_rgb(6, 182, 212),   // Cyan
    Color32::from_rgb(236, 72, 153),  // Pink
    Color32::from_rgb(132, 204, 22),  // Lime
    Color32::from_rgb(249, 115, 22),  // Orange
    Color32::from_rgb(100, 116, 139), // Slate
];

/// Segments used to approximate one full pie circle.
const PIE_SEGMENTS: usize = 120;

/// Creates interactive charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Color for the i-th series or slice.
    pub fn color_at(colors: &[Color32], index: usize) -> Color32 {
        if colors.is_empty() {
            PALETTE[index % PALETTE.len()]
        } else {
            colors[index % colors.len()]
        }
    }

    /// Red-white-blue color for a correlation in [-1, 1].
    pub fn diverging_color(value: f64) -> Color32 {
        if value.is_nan() {
            return Color32::GRAY;
        }
        let v = value.clamp(-1.0, 1.0) as f32;
        let lerp = |a: u8, b: u8, t: f32| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        if v < 0.0 {
            let t = -v;
            Color32::from_rgb(lerp(247, 178, t), lerp(247, 24, t), lerp(247, 43, t))
        } else {
            Color32::from_rgb(lerp(247, 33, v), lerp(247, 102, v), lerp(247, 172, v))
        }
    }

    /// Format a unix timestamp (seconds) as a date label.
    pub fn format_timestamp(seconds: f64) -> String {
        DateTime::from_timestamp(seconds as i64, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    /// Draw any chart kind.
    pub fn draw(ui: &mut egui::Ui, chart: &ChartData, colors: &[Color32], height: f32) {
        match (&chart.kind, &chart.series) {
            (ChartKind::Pie, ChartSeries::Categories { labels, counts }) => {
                Self::draw_pie(ui, chart, labels, counts, colors, height)
            }
            (_, ChartSeries::Categories { labels, counts }) => {
                Self::draw_bars(ui, chart, labels, counts, colors, height)
            }
            (_, ChartSeries::Xy { points, x_labels }) => {
                Self::draw_xy(ui, chart, points, x_labels.as_deref(), colors, height)
            }
            (_, ChartSeries::Histogram { bins }) => {
                let color = Self::color_at(colors, 0);
                let bars = bins
                    .iter()
                    .map(|b| {
                        Bar::new(b.center(), b.count as f64)
                            .width(b.width())
                            .fill(color.gamma_multiply(0.7))
                            .stroke(egui::Stroke::new(1.0, Color32::BLACK))
                    })
                    .collect();
                Self::base_plot(chart, height).show(ui, |plot_ui| {
                    plot_ui.bar_chart(BarChart::new(bars).name(&chart.x_label));
                });
            }
            (_, ChartSeries::Heatmap { names, matrix }) => {
                Self::draw_heatmap(ui, chart, names, matrix)
            }
        }
    }

    fn base_plot(chart: &ChartData, height: f32) -> Plot {
        Plot::new(format!("chart_{}", chart.id))
            .height(height)
            .allow_scroll(false)
            .x_axis_label(chart.x_label.clone())
            .y_axis_label(chart.y_label.clone())
    }

    fn draw_xy(
        ui: &mut egui::Ui,
        chart: &ChartData,
        points: &[[f64; 2]],
        x_labels: Option<&[String]>,
        colors: &[Color32],
        height: f32,
    ) {
        let color = Self::color_at(colors, 0);
        let mut plot = Self::base_plot(chart, height);

        if let Some(labels) = x_labels {
            let labels = labels.to_vec();
            plot = plot.x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if idx >= 0.0 && (idx - mark.value).abs() < 1e-6 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            });
        } else if chart.time_x {
            plot = plot.x_axis_formatter(|mark, _range| Self::format_timestamp(mark.value));
        }

        plot.show(ui, |plot_ui| match chart.kind {
            ChartKind::Scatter => {
                plot_ui.points(
                    Points::new(PlotPoints::from(points.to_vec()))
                        .radius(3.0)
                        .color(color.gamma_multiply(0.6))
                        .name(&chart.y_label),
                );
            }
            _ => {
                plot_ui.line(
                    Line::new(PlotPoints::from(points.to_vec()))
                        .color(color)
                        .width(2.0)
                        .name(&chart.y_label),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(points.to_vec()))
                        .radius(3.5)
                        .color(color),
                );
            }
        });
    }

    fn draw_bars(
        ui: &mut egui::Ui,
        chart: &ChartData,
        labels: &[String],
        counts: &[f64],
        colors: &[Color32],
        height: f32,
    ) {
        let single_color = colors.len() <= 1;
        let bars: Vec<Bar> = labels
            .iter()
            .zip(counts.iter())
            .enumerate()
            .map(|(i, (label, &count))| {
                let color = if single_color {
                    Self::color_at(colors, 0)
                } else {
                    Self::color_at(colors, i)
                };
                Bar::new(i as f64, count).width(0.7).name(label).fill(color)
            })
            .collect();

        let x_labels = labels.to_vec();
        Self::base_plot(chart, height)
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if idx >= 0.0 && (idx - mark.value).abs() < 1e-6 {
                    x_labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).name(&chart.x_label));
            });
    }

    /// Points of one pie slice, starting at 12 o'clock and going clockwise.
    pub fn pie_slice(start_fraction: f64, end_fraction: f64) -> Vec<[f64; 2]> {
        let steps = (((end_fraction - start_fraction) * PIE_SEGMENTS as f64).ceil() as usize).max(1);
        let mut pts = vec![[0.0, 0.0]];
        for s in 0..=steps {
            let f = start_fraction + (end_fraction - start_fraction) * s as f64 / steps as f64;
            let angle = std::f64::consts::FRAC_PI_2 - f * std::f64::consts::TAU;
            pts.push([angle.cos(), angle.sin()]);
        }
        pts
    }

    fn draw_pie(
        ui: &mut egui::Ui,
        chart: &ChartData,
        labels: &[String],
        counts: &[f64],
        colors: &[Color32],
        height: f32,
    ) {
        let total: f64 = counts.iter().sum();
        if total <= 0.0 {
            ui.label(RichText::new("No data").color(Color32::GRAY));
            return;
        }

        Plot::new(format!("chart_{}", chart.id))
            .height(height)
            .data_aspect(1.0)
            .show_axes(false)
            .show_grid(false)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                let mut start = 0.0;
                for (i, (label, count)) in labels.iter().zip(counts.iter()).enumerate() {
                    let fraction = count / total;
                    let end = start + fraction;
                    let color = Self::color_at(colors, i);

                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(Self::pie_slice(start, end)))
                            .fill_color(color)
                            .stroke(egui::Stroke::new(1.0, Color32::WHITE))
                            .name(label),
                    );

                    let mid = std::f64::consts::FRAC_PI_2
                        - (start + fraction / 2.0) * std::f64::consts::TAU;
                    plot_ui.text(Text::new(
                        PlotPoint::new(0.65 * mid.cos(), 0.65 * mid.sin()),
                        RichText::new(format!("{:.1}%", fraction * 100.0))
                            .color(Color32::WHITE)
                            .strong(),
                    ));
                    start = end;
                }
            });
    }

    fn draw_heatmap(ui: &mut egui::Ui, chart: &ChartData, names: &[String], matrix: &[Vec<f64>]) {
        let cell = egui::vec2(70.0, 28.0);

        egui::ScrollArea::horizontal()
            .id_salt(format!("heatmap_{}", chart.id))
            .show(ui, |ui| {
                egui::Grid::new(format!("heatmap_grid_{}", chart.id))
                    .spacing([2.0, 2.0])
                    .show(ui, |ui| {
                        ui.label("");
                        for name in names {
                            ui.add_sized(cell, egui::Label::new(RichText::new(name).small().strong()).truncate());
                        }
                        ui.end_row();

                        for (row_name, row) in names.iter().zip(matrix.iter()) {
                            ui.label(RichText::new(row_name).small().strong());
                            for &value in row {
                                let (rect, _) = ui.allocate_exact_size(cell, egui::Sense::hover());
                                ui.painter()
                                    .rect_filled(rect, 2.0, Self::diverging_color(value));
                                let text_color = if value.abs() > 0.6 {
                                    Color32::WHITE
                                } else {
                                    Color32::BLACK
                                };
                                ui.painter().text(
                                    rect.center(),
                                    egui::Align2::CENTER_CENTER,
                                    format!("{:.2}", value),
                                    egui::FontId::proportional(11.0),
                                    text_color,
                                );
                            }
                            ui.end_row();
                        }
                    });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diverging_color_endpoints() {
        assert_eq!(ChartPlotter::diverging_color(0.0), Color32::from_rgb(247, 247, 247));
        assert_eq!(ChartPlotter::diverging_color(1.0), Color32::from_rgb(33, 102, 172));
        assert_eq!(ChartPlotter::diverging_color(-2.0), Color32::from_rgb(178, 24, 43));
        assert_eq!(ChartPlotter::diverging_color(f64::NAN), Color32::GRAY);
    }

    #[test]
    fn pie_slice_starts_at_center_and_top() {
        let pts = ChartPlotter::pie_slice(0.0, 0.25);
        assert_eq!(pts[0], [0.0, 0.0]);
        assert!((pts[1][0] - 0.0).abs() < 1e-9 && (pts[1][1] - 1.0).abs() < 1e-9);
        let last = pts.last().unwrap();
        assert!((last[0] - 1.0).abs() < 1e-9 && last[1].abs() < 1e-9);
    }

    #[test]
    fn timestamps_format_as_dates() {
        assert_eq!(ChartPlotter::format_timestamp(0.0), "1970-01-01");
        assert_eq!(ChartPlotter::format_timestamp(1_700_000_000.0), "2023-11-14");
    }

    #[test]
    fn colors_cycle() {
        let custom = [Color32::RED, Color32::GREEN];
        assert_eq!(ChartPlotter::color_at(&custom, 3), Color32::GREEN);
        assert_eq!(ChartPlotter::color_at(&[], 10), PALETTE[0]);
    }
}
