//! Data Explorer Main Application
//! Header with theme toggle, Migration Tool / Data Explorer tabs and a status bar.

use crate::config::ThemeConfig;
use crate::gui::theme::Palette;
use crate::gui::{ExplorerTab, MigrationTab};
use egui::RichText;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Migration,
    Explorer,
}

impl Tab {
    pub fn label(&self) -> &'static str {
        match self {
            Tab::Migration => "🔄 Migration Tool",
            Tab::Explorer => "📊 Data Explorer",
        }
    }

    /// Status bar text shown while the tab is active.
    pub fn status(&self) -> &'static str {
        match self {
            Tab::Migration => "Migration Tool - Load user data files to analyze migration patterns",
            Tab::Explorer => "Data Explorer - Upload CSV/JSON files to explore and visualize your data",
        }
    }
}

/// Main application window.
pub struct ExplorerApp {
    theme: ThemeConfig,
    palette: Palette,
    tab: Tab,
    status: String,
    migration: MigrationTab,
    explorer: ExplorerTab,
}

impl ExplorerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let theme = ThemeConfig::load();
        let palette = Palette::for_mode(theme.mode());
        palette.apply(&cc.egui_ctx, theme.mode());

        Self {
            theme,
            palette,
            tab: Tab::default(),
            status: "Ready - Welcome to Data Explorer".to_string(),
            migration: MigrationTab::new(),
            explorer: ExplorerTab::new(),
        }
    }

    fn toggle_theme(&mut self, ctx: &egui::Context) {
        let mode = self.theme.toggle();
        self.palette = Palette::for_mode(mode);
        self.palette.apply(ctx, mode);
    }

    fn show_header(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.label(
                    RichText::new("📊 Data Explorer")
                        .size(24.0)
                        .strong()
                        .color(self.palette.primary),
                );
                ui.label(
                    RichText::new("Migration Tool & Data Visualization")
                        .size(12.0)
                        .color(self.palette.text_secondary),
                );
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button(self.theme.mode().toggle_label()).clicked() {
                    self.toggle_theme(ctx);
                }
            });
        });
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            for tab in [Tab::Migration, Tab::Explorer] {
                let text = RichText::new(tab.label()).size(15.0);
                if ui.selectable_label(self.tab == tab, text).clicked() && self.tab != tab {
                    self.tab = tab;
                    self.status = tab.status().to_string();
                }
            }
        });
        ui.add_space(4.0);
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.migration.check_load_results();
        self.explorer.check_load_results();

        if self.migration.is_busy() || self.explorer.is_busy() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            self.show_header(ctx, ui);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.label(
                RichText::new(&self.status)
                    .size(12.0)
                    .color(self.palette.info),
            );
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.tab {
            Tab::Migration => self.migration.show(ui, &self.palette),
            Tab::Explorer => self.explorer.show(ui, &self.palette),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_have_status_messages() {
        assert_eq!(Tab::default(), Tab::Migration);
        assert!(Tab::Migration.status().starts_with("Migration Tool - "));
        assert!(Tab::Explorer.status().starts_with("Data Explorer - "));
    }
}
