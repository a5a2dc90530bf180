//! Control Panel Widget
//! Chart settings for the Data Explorer tab: kind, target and columns.

use crate::charts::{ChartKind, ChartTarget};
use egui::{ComboBox, RichText};

/// User chart settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    pub kind: ChartKind,
    pub target: ChartTarget,
    pub x_col: String,
    pub y_col: String,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            kind: ChartKind::Line,
            target: ChartTarget::Embedded,
            x_col: String::new(),
            y_col: String::new(),
        }
    }
}

/// Chart controls with column selectors.
#[derive(Default)]
pub struct ControlPanel {
    pub settings: ChartSettings,
    pub columns: Vec<String>,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update available columns after a file load.
    /// Selections still present are kept; otherwise X falls back to the first
    /// column and Y to the first numeric one.
    pub fn update_columns(&mut self, columns: Vec<String>, numeric_columns: &[String]) {
        if !columns.contains(&self.settings.x_col) {
            self.settings.x_col = columns.first().cloned().unwrap_or_default();
        }
        if !columns.contains(&self.settings.y_col) {
            self.settings.y_col = numeric_columns
                .first()
                .or_else(|| columns.first())
                .cloned()
                .unwrap_or_default();
        }
        self.columns = columns;
    }

    fn column_combo(ui: &mut egui::Ui, id: &str, selected: &mut String, columns: &[String]) {
        ComboBox::from_id_salt(id)
            .width(180.0)
            .selected_text(selected.as_str())
            .show_ui(ui, |ui| {
                for col in columns {
                    ui.selectable_value(selected, col.clone(), col);
                }
            });
    }

    /// Draw the controls
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new("Chart Type:").strong());
            ComboBox::from_id_salt("chart_kind")
                .width(120.0)
                .selected_text(self.settings.kind.label())
                .show_ui(ui, |ui| {
                    for kind in ChartKind::ALL {
                        ui.selectable_value(&mut self.settings.kind, kind, kind.label());
                    }
                });

            ui.add_space(12.0);
            ui.label(RichText::new("Display:").strong());
            ui.radio_value(&mut self.settings.target, ChartTarget::Embedded, "Embedded");
            ui.radio_value(&mut self.settings.target, ChartTarget::Browser, "Browser");
        });

        ui.add_space(6.0);

        // Heatmaps use every numeric column.
        let needs_columns = self.settings.kind != ChartKind::Heatmap;
        ui.add_enabled_ui(needs_columns, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.label(RichText::new("X Column:").strong());
                Self::column_combo(ui, "x_col", &mut self.settings.x_col, &self.columns);
                ui.add_space(12.0);
                ui.label(RichText::new("Y Column:").strong());
                Self::column_combo(ui, "y_col", &mut self.settings.y_col, &self.columns);
            });
        });

        ui.add_space(8.0);

        ui.add_enabled_ui(!self.columns.is_empty(), |ui| {
            let button = egui::Button::new(RichText::new("📊 Generate Chart").size(14.0))
                .min_size(egui::vec2(160.0, 30.0));
            if ui.add(button).clicked() {
                action = ControlPanelAction::Generate;
            }
        });

        action
    }
}

/// Actions triggered by the control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    Generate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn columns_pick_defaults() {
        let mut panel = ControlPanel::new();
        panel.update_columns(names(&["id", "name", "age"]), &names(&["id", "age"]));
        assert_eq!(panel.settings.x_col, "id");
        assert_eq!(panel.settings.y_col, "id");

        panel.update_columns(names(&["name", "age"]), &names(&["age"]));
        assert_eq!(panel.settings.x_col, "name");
        assert_eq!(panel.settings.y_col, "age");

        panel.update_columns(names(&["only"]), &[]);
        assert_eq!(panel.settings.y_col, "only");

        panel.update_columns(Vec::new(), &[]);
        assert!(panel.settings.x_col.is_empty());
        assert!(panel.settings.y_col.is_empty());
    }

    #[test]
    fn valid_selections_survive_a_reload() {
        let mut panel = ControlPanel::new();
        panel.update_columns(names(&["city", "temp", "rain"]), &names(&["temp", "rain"]));
        panel.settings.x_col = "temp".to_string();
        panel.settings.y_col = "rain".to_string();

        panel.update_columns(names(&["rain", "temp", "wind"]), &names(&["rain", "temp", "wind"]));
        assert_eq!(panel.settings.x_col, "temp");
        assert_eq!(panel.settings.y_col, "rain");

        panel.update_columns(names(&["city", "wind"]), &names(&["wind"]));
        assert_eq!(panel.settings.x_col, "city");
        assert_eq!(panel.settings.y_col, "wind");
    }
}
