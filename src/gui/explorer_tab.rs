//! Data Explorer tab
//! Load a CSV/JSON/JSONL file, read its overview, chart it and browse the rows.

use crate::charts::{ChartBuilder, ChartError, ChartTarget, StaticChartRenderer};
use crate::data::{format_thousands, load_file, DataInfo, DataLoader, DataProcessor, LoadedData};
use crate::gui::theme::Palette;
use crate::gui::widgets::{card, heading, path_row, show_error, stat_card, status_label};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use anyhow::Context;
use egui::{RichText, ScrollArea};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use tracing::info;

/// Rows shown in the table view.
pub const TABLE_ROW_LIMIT: usize = 1000;

const TABLE_ROW_HEIGHT: f32 = 22.0;
const TABLE_COL_WIDTH: f32 = 160.0;

/// File loading result from background thread
enum LoadResult {
    Complete { data: LoadedData, info: DataInfo },
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ExplorerView {
    #[default]
    Overview,
    Charts,
    Table,
}

pub struct ExplorerTab {
    file_path: String,
    status: String,
    loader: DataLoader,
    info: Option<DataInfo>,
    overview: String,
    view: ExplorerView,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    table_search: String,
    table_rows: Vec<usize>,

    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl Default for ExplorerTab {
    fn default() -> Self {
        Self {
            file_path: String::new(),
            status: "No data loaded".to_string(),
            loader: DataLoader::new(),
            info: None,
            overview: String::new(),
            view: ExplorerView::default(),
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
            table_search: String::new(),
            table_rows: Vec::new(),
            load_rx: None,
            is_loading: false,
        }
    }
}

impl ExplorerTab {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.is_loading
    }

    fn handle_browse(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Data Files", &["csv", "json", "jsonl"])
            .add_filter("CSV Files", &["csv"])
            .add_filter("JSON Files", &["json", "jsonl"])
            .pick_file()
        {
            self.file_path = path.to_string_lossy().to_string();
        }
    }

    /// Load the selected file in a background thread.
    fn start_loading(&mut self) {
        if self.is_loading {
            return;
        }

        let path = PathBuf::from(self.file_path.trim());
        if self.file_path.trim().is_empty() || !path.is_file() {
            show_error("Please select a valid file");
            return;
        }

        self.status = "Loading data...".to_string();
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let result = load_file(&path).context("Failed to load data");
            let message = match result {
                Ok(data) => {
                    let info = DataProcessor::dataframe_info(&data.df);
                    LoadResult::Complete { data, info }
                }
                Err(e) => LoadResult::Error(format!("{:#}", e)),
            };
            let _ = tx.send(message);
        });
    }

    /// Check for loading results
    pub fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete { data, info }) => {
                self.status = format!(
                    "✓ Loaded: {} rows, {} columns",
                    format_thousands(info.rows as u64),
                    info.columns.len()
                );
                info!("{}", self.status);
                self.overview = DataProcessor::render_overview(&info);
                self.control_panel
                    .update_columns(info.columns.clone(), &info.numeric_columns);
                self.chart_viewer.clear();
                self.table_search.clear();
                self.table_rows = DataProcessor::search_rows(&data.df, "", TABLE_ROW_LIMIT);
                self.loader.set_data(data);
                self.info = Some(info);
                self.is_loading = false;
            }
            Ok(LoadResult::Error(error)) => {
                self.status = "✗ Error loading data".to_string();
                self.is_loading = false;
                show_error(&error);
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.status = "✗ Error loading data".to_string();
                self.is_loading = false;
            }
        }
    }

    fn generate_chart(&mut self) {
        let Some(df) = self.loader.get_dataframe() else {
            show_error("Please load data first");
            return;
        };

        let settings = &self.control_panel.settings;
        let chart = match ChartBuilder::build(df, settings.kind, &settings.x_col, &settings.y_col)
        {
            Ok(chart) => chart,
            Err(e @ ChartError::NotEnoughNumericColumns) => {
                show_error(&e.to_string());
                return;
            }
            Err(e) => {
                show_error(&format!("Failed to generate chart: {}", e));
                return;
            }
        };

        match settings.target {
            ChartTarget::Embedded => self.chart_viewer.push(chart),
            ChartTarget::Browser => match StaticChartRenderer::open_in_browser(&chart) {
                Ok(_) => {
                    rfd::MessageDialog::new()
                        .set_level(rfd::MessageLevel::Info)
                        .set_title("Chart Generated")
                        .set_description("Interactive chart opened in your browser")
                        .set_buttons(rfd::MessageButtons::Ok)
                        .show();
                }
                Err(e) => show_error(&format!("Failed to generate chart: {}", e)),
            },
        }
    }

    fn refresh_table(&mut self) {
        self.table_rows = self
            .loader
            .get_dataframe()
            .map(|df| DataProcessor::search_rows(df, &self.table_search, TABLE_ROW_LIMIT))
            .unwrap_or_default();
    }

    pub fn show(&mut self, ui: &mut egui::Ui, palette: &Palette) {
        card(ui, palette, |ui| {
            heading(ui, "📁 Data File");
            if path_row(ui, "File:", &mut self.file_path, 60.0) {
                self.handle_browse();
            }
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.add_enabled_ui(!self.is_loading, |ui| {
                    if ui.button(RichText::new("⬆ Load Data").size(14.0)).clicked() {
                        self.start_loading();
                    }
                });
                if self.is_loading {
                    ui.spinner();
                }
                ui.add_space(20.0);
                status_label(ui, palette, &self.status);
            });
        });

        ui.add_space(10.0);

        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.view, ExplorerView::Overview, "📋 Overview");
            ui.selectable_value(&mut self.view, ExplorerView::Charts, "📈 Charts");
            ui.selectable_value(&mut self.view, ExplorerView::Table, "🗂 Data Table");
        });
        ui.separator();

        match self.view {
            ExplorerView::Overview => self.show_overview(ui, palette),
            ExplorerView::Charts => self.show_charts(ui, palette),
            ExplorerView::Table => self.show_table(ui, palette),
        }
    }

    fn show_overview(&mut self, ui: &mut egui::Ui, palette: &Palette) {
        let Some(info) = &self.info else {
            ui.label(RichText::new("Load a file to see its overview").color(palette.text_secondary));
            return;
        };

        ui.horizontal_wrapped(|ui| {
            stat_card(ui, palette, "Rows", &format_thousands(info.rows as u64), palette.primary);
            stat_card(
                ui,
                palette,
                "Columns",
                &info.columns.len().to_string(),
                palette.info,
            );
            stat_card(
                ui,
                palette,
                "Numeric",
                &info.numeric_columns.len().to_string(),
                palette.success,
            );
            stat_card(
                ui,
                palette,
                "Categorical",
                &info.categorical_columns.len().to_string(),
                palette.warning,
            );
        });

        ui.add_space(10.0);

        card(ui, palette, |ui| {
            if let (Some(name), Some(kind)) =
                (self.loader.get_file_name(), self.loader.get_file_kind())
            {
                heading(ui, &format!("📄 {} ({})", name, kind.label()));
            }
            ScrollArea::vertical()
                .id_salt("overview_text")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.label(RichText::new(&self.overview).monospace());
                });
        });
    }

    fn show_charts(&mut self, ui: &mut egui::Ui, palette: &Palette) {
        card(ui, palette, |ui| {
            heading(ui, "⚙ Chart Settings");
            if self.control_panel.show(ui) == ControlPanelAction::Generate {
                self.generate_chart();
            }
        });
        ui.add_space(10.0);
        self.chart_viewer.show(ui, palette);
    }

    fn show_table(&mut self, ui: &mut egui::Ui, palette: &Palette) {
        if self.loader.get_dataframe().is_none() {
            ui.label(RichText::new("Load a file to browse its rows").color(palette.text_secondary));
            return;
        }

        let mut search_changed = false;
        ui.horizontal(|ui| {
            ui.label("🔍 Search:");
            search_changed = ui
                .add(egui::TextEdit::singleline(&mut self.table_search).desired_width(300.0))
                .changed();
            ui.label(
                RichText::new(format!(
                    "Showing {} of {} rows",
                    format_thousands(self.table_rows.len() as u64),
                    format_thousands(self.loader.get_row_count() as u64)
                ))
                .color(palette.text_secondary),
            );
        });

        if search_changed {
            self.refresh_table();
        }

        let Some(df) = self.loader.get_dataframe() else {
            return;
        };
        let names = self.loader.get_columns();
        let rows = &self.table_rows;

        ScrollArea::horizontal()
            .id_salt("table_h")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    for name in &names {
                        ui.add_sized(
                            [TABLE_COL_WIDTH, TABLE_ROW_HEIGHT],
                            egui::Label::new(RichText::new(name).strong()).truncate(),
                        );
                    }
                });
                ui.separator();

                ScrollArea::vertical()
                    .id_salt("table_v")
                    .auto_shrink([false, false])
                    .show_rows(ui, TABLE_ROW_HEIGHT, rows.len(), |ui, row_range| {
                        for &row in &rows[row_range] {
                            ui.horizontal(|ui| {
                                for col in 0..names.len() {
                                    ui.add_sized(
                                        [TABLE_COL_WIDTH, TABLE_ROW_HEIGHT],
                                        egui::Label::new(DataProcessor::cell_text(df, row, col))
                                            .truncate(),
                                    );
                                }
                            });
                        }
                    });
            });
    }
}
