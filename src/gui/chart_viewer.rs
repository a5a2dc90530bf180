//! Chart Viewer Widget
//! Scrollable gallery of the most recent embedded charts.
//! Cards wrap into as many columns as the available width allows.

use crate::charts::{ChartData, ChartPlotter};
use crate::gui::theme::Palette;
use egui::{RichText, ScrollArea};
use std::collections::VecDeque;

/// Charts kept in the gallery; older ones are dropped.
pub const GALLERY_SIZE: usize = 4;

const CHART_SPACING: f32 = 15.0;
const CARD_HEIGHT: f32 = 420.0;
const CHART_WIDTH: f32 = 640.0;
const PLOT_HEIGHT: f32 = 340.0;

/// Most recent embedded charts, newest first.
#[derive(Default)]
pub struct ChartViewer {
    charts: VecDeque<ChartData>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chart, evicting the oldest beyond `GALLERY_SIZE`.
    pub fn push(&mut self, chart: ChartData) {
        self.charts.push_front(chart);
        self.charts.truncate(GALLERY_SIZE);
    }

    pub fn clear(&mut self) {
        self.charts.clear();
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn show(&mut self, ui: &mut egui::Ui, palette: &Palette) {
        if self.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(
                    RichText::new("No charts yet - pick columns and press Generate Chart")
                        .size(16.0)
                        .color(palette.text_secondary),
                );
            });
            return;
        }

        let avail_width = ui.available_width();
        let num_columns = ((avail_width / (CHART_WIDTH + CHART_SPACING)).floor() as usize).max(1);
        let total_items = self.len();
        ui.label(
            RichText::new(format!("Recent charts ({}/{})", total_items, GALLERY_SIZE))
                .color(palette.text_secondary),
        );
        let total_rows = total_items.div_ceil(num_columns);
        let row_height = CARD_HEIGHT + CHART_SPACING;
        let colors = palette.chart_colors();

        ScrollArea::vertical()
            .id_salt("chart_gallery")
            .auto_shrink([false, false])
            .show_rows(ui, row_height, total_rows, |ui, row_range| {
                for row in row_range {
                    ui.horizontal(|ui| {
                        for col in 0..num_columns {
                            let idx = row * num_columns + col;
                            if let Some(chart) = self.charts.get(idx) {
                                Self::draw_chart_card(ui, chart, palette, &colors);
                                ui.add_space(CHART_SPACING);
                            }
                        }
                    });
                    ui.add_space(CHART_SPACING);
                }
            });
    }

    fn draw_chart_card(
        ui: &mut egui::Ui,
        chart: &ChartData,
        palette: &Palette,
        colors: &[egui::Color32],
    ) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, palette.border))
            .fill(palette.bg_secondary)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(CHART_WIDTH - 24.0);
                ui.set_height(CARD_HEIGHT - 24.0);
                ui.vertical(|ui| {
                    ui.label(RichText::new(&chart.title).size(16.0).strong());
                    ui.add_space(6.0);
                    ChartPlotter::draw(ui, chart, colors, PLOT_HEIGHT);
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{ChartKind, ChartSeries};

    fn chart(title: &str) -> ChartData {
        ChartData::new(
            ChartKind::Bar,
            title,
            "x",
            "Count",
            ChartSeries::Categories {
                labels: vec!["a".into()],
                counts: vec![1.0],
            },
        )
    }

    #[test]
    fn keeps_only_latest_charts() {
        let mut viewer = ChartViewer::new();
        for i in 0..6 {
            viewer.push(chart(&format!("chart {}", i)));
        }
        assert_eq!(viewer.len(), GALLERY_SIZE);
        let titles: Vec<&str> = viewer.charts.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["chart 5", "chart 4", "chart 3", "chart 2"]);

        viewer.clear();
        assert!(viewer.is_empty());
    }
}
