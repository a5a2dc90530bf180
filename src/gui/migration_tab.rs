//! Migration Tool tab
//! Loads the output of a comparison run and lets the user browse matched
//! and unmatched users.

use crate::charts::{ChartData, ChartKind, ChartPlotter, ChartSeries};
use crate::data::format_thousands;
use crate::gui::theme::Palette;
use crate::gui::widgets::{card, heading, path_row, show_error, stat_card, status_label};
use crate::migration::{
    filter_users, load_migration_files, matched_user_details, points_timeline,
    sync_report_summary, unmatched_user_details, MigrationData, MigrationPaths, SyncReport,
    UserFilter, UserKind, UserRef, UserRow,
};
use anyhow::Context;
use egui::{RichText, ScrollArea};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use tracing::info;

/// Directory a comparison run writes into.
const DEFAULT_OUTPUT_DIR: &str = "output";

const LIST_ROW_HEIGHT: f32 = 22.0;
const LIST_HEIGHT: f32 = 380.0;
const CHART_HEIGHT: f32 = 280.0;

/// Migration loading result from background thread
enum LoadResult {
    Complete(MigrationData),
    Error(String),
}

fn path_text(path: Option<PathBuf>) -> String {
    path.map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Fixed-width browser line; ids, emails and names are already truncated.
fn row_text(id: &str, email: &str, name: &str, points: &str) -> String {
    format!("{:<45}  {:<50}  {:<40}  {:>12}", id, email, name, points)
}

fn optional_path(text: &str) -> Option<PathBuf> {
    let text = text.trim();
    (!text.is_empty()).then(|| PathBuf::from(text))
}

fn match_status_chart(report: &SyncReport) -> Option<ChartData> {
    let matched = report.matched_users as f64;
    let unmatched = report.unmatched() as f64;
    if matched + unmatched <= 0.0 {
        return None;
    }
    Some(ChartData::new(
        ChartKind::Pie,
        "User Match Status",
        "",
        "",
        ChartSeries::Categories {
            labels: vec!["Matched".to_string(), "Unmatched".to_string()],
            counts: vec![matched, unmatched],
        },
    ))
}

fn source_chart(report: &SyncReport) -> ChartData {
    ChartData::new(
        ChartKind::Bar,
        "Users by Source",
        "Source",
        "Count",
        ChartSeries::Categories {
            labels: vec!["Clerk".to_string(), "Convex".to_string()],
            counts: vec![
                report.total_clerk_users as f64,
                report.total_convex_users as f64,
            ],
        },
    )
}

pub struct MigrationTab {
    linked_path: String,
    unmatched_path: String,
    report_path: String,
    status: String,

    data: MigrationData,
    rows: Vec<UserRow>,
    filter: UserFilter,
    search: String,

    selected: Option<UserRef>,
    details: String,
    timeline: Option<ChartData>,

    summary: String,
    status_chart: Option<ChartData>,
    source_chart: Option<ChartData>,

    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl MigrationTab {
    /// Pre-fills the paths with files from a previous comparison run.
    pub fn new() -> Self {
        let defaults = MigrationPaths::discover(Path::new(DEFAULT_OUTPUT_DIR));
        Self {
            linked_path: path_text(defaults.linked_users),
            unmatched_path: path_text(defaults.unmatched_users),
            report_path: path_text(defaults.sync_report),
            status: "No data loaded".to_string(),
            data: MigrationData::default(),
            rows: Vec::new(),
            filter: UserFilter::All,
            search: String::new(),
            selected: None,
            details: String::new(),
            timeline: None,
            summary: String::new(),
            status_chart: None,
            source_chart: None,
            load_rx: None,
            is_loading: false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.is_loading
    }

    fn browse(target: &mut String, title: &str, name: &str, extension: &str) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title(title)
            .add_filter(name, &[extension])
            .add_filter("All files", &["*"])
            .pick_file()
        {
            *target = path.to_string_lossy().to_string();
        }
    }

    fn start_loading(&mut self) {
        if self.is_loading {
            return;
        }

        let paths = MigrationPaths {
            linked_users: optional_path(&self.linked_path),
            unmatched_users: optional_path(&self.unmatched_path),
            sync_report: optional_path(&self.report_path),
        };

        self.status = "Loading data...".to_string();
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let message = match load_migration_files(&paths).context("Failed to load data") {
                Ok(data) => LoadResult::Complete(data),
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
            Ok(LoadResult::Complete(data)) => {
                self.status = format!(
                    "✓ Loaded: {} linked, {} unmatched",
                    data.linked_users.len(),
                    data.unmatched_users.len()
                );
                info!("{}", self.status);
                self.set_data(data);
                self.is_loading = false;
            }
            Ok(LoadResult::Error(error)) => {
                self.status = "✗ Error loading data".to_string();
                self.is_loading = false;
                show_error(&error);
            }
            Err(TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(TryRecvError::Disconnected) => {
                self.status = "✗ Error loading data".to_string();
                self.is_loading = false;
            }
        }
    }

    fn set_data(&mut self, data: MigrationData) {
        match &data.sync_report {
            Some(report) => {
                self.summary = sync_report_summary(report);
                self.status_chart = match_status_chart(report);
                self.source_chart = Some(source_chart(report));
            }
            None => {
                self.summary.clear();
                self.status_chart = None;
                self.source_chart = None;
            }
        }
        self.data = data;
        self.selected = None;
        self.details.clear();
        self.timeline = None;
        self.apply_filters();
    }

    fn apply_filters(&mut self) {
        self.rows = filter_users(&self.data, self.filter, &self.search);
    }

    fn select(&mut self, user: UserRef) {
        self.selected = Some(user);
        self.timeline = None;
        self.details = match user.kind {
            UserKind::Matched => match self.data.linked_users.get(user.index) {
                Some(linked) => {
                    let points = points_timeline(linked);
                    if !points.is_empty() {
                        self.timeline = Some(
                            ChartData::new(
                                ChartKind::Line,
                                "Points History Timeline",
                                "Date",
                                "Points Earned",
                                ChartSeries::Xy {
                                    points,
                                    x_labels: None,
                                },
                            )
                            .with_time_axis(),
                        );
                    }
                    matched_user_details(linked)
                }
                None => String::new(),
            },
            UserKind::Unmatched => self
                .data
                .unmatched_users
                .get(user.index)
                .map(unmatched_user_details)
                .unwrap_or_default(),
        };
    }

    pub fn show(&mut self, ui: &mut egui::Ui, palette: &Palette) {
        ScrollArea::vertical()
            .id_salt("migration_tab")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                self.show_file_card(ui, palette);
                ui.add_space(10.0);
                self.show_stat_cards(ui, palette);
                ui.add_space(10.0);

                ui.columns(2, |cols| {
                    self.show_user_browser(&mut cols[0], palette);
                    self.show_details(&mut cols[1], palette);
                });

                ui.add_space(10.0);
                self.show_summary(ui, palette);
            });
    }

    fn show_file_card(&mut self, ui: &mut egui::Ui, palette: &Palette) {
        card(ui, palette, |ui| {
            heading(ui, "📁 Load Migration Data");
            let label_width = 130.0;
            if path_row(ui, "Linked Users:", &mut self.linked_path, label_width) {
                Self::browse(
                    &mut self.linked_path,
                    "Select Linked Users File",
                    "JSONL files",
                    "jsonl",
                );
            }
            if path_row(ui, "Unmatched Users:", &mut self.unmatched_path, label_width) {
                Self::browse(
                    &mut self.unmatched_path,
                    "Select Unmatched Users File",
                    "JSONL files",
                    "jsonl",
                );
            }
            if path_row(ui, "Sync Report:", &mut self.report_path, label_width) {
                Self::browse(
                    &mut self.report_path,
                    "Select Sync Report File",
                    "JSON files",
                    "json",
                );
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
    }

    fn show_stat_cards(&self, ui: &mut egui::Ui, palette: &Palette) {
        let Some(report) = &self.data.sync_report else {
            return;
        };
        ui.horizontal_wrapped(|ui| {
            stat_card(
                ui,
                palette,
                "Total Users",
                &format_thousands(report.total_clerk_users),
                palette.primary,
            );
            stat_card(
                ui,
                palette,
                "Matched",
                &format_thousands(report.matched_users),
                palette.success,
            );
            stat_card(
                ui,
                palette,
                "Unmatched",
                &format_thousands(report.unmatched()),
                palette.warning,
            );
            stat_card(
                ui,
                palette,
                "Match Rate",
                &format!("{:.1}%", report.match_rate_percent),
                palette.info,
            );
        });
    }

    fn show_user_browser(&mut self, ui: &mut egui::Ui, palette: &Palette) {
        card(ui, palette, |ui| {
            heading(ui, "👥 Browse Users");

            let mut changed = false;
            ui.horizontal(|ui| {
                ui.label("🔍 Search:");
                changed |= ui
                    .add(egui::TextEdit::singleline(&mut self.search).desired_width(220.0))
                    .changed();
            });
            ui.horizontal(|ui| {
                changed |= ui
                    .radio_value(&mut self.filter, UserFilter::All, "All")
                    .changed();
                changed |= ui
                    .radio_value(&mut self.filter, UserFilter::Matched, "Matched")
                    .changed();
                changed |= ui
                    .radio_value(&mut self.filter, UserFilter::Unmatched, "Unmatched")
                    .changed();
            });
            if changed {
                self.apply_filters();
            }

            ui.add_space(6.0);
            let mut clicked = None;
            ScrollArea::horizontal()
                .id_salt("user_list_h")
                .show(ui, |ui| {
                    ui.label(
                        RichText::new(row_text("ID", "Email", "Name", "Points"))
                            .monospace()
                            .strong(),
                    );
                    ui.separator();

                    ScrollArea::vertical()
                        .id_salt("user_list")
                        .max_height(LIST_HEIGHT)
                        .auto_shrink([false, true])
                        .show_rows(ui, LIST_ROW_HEIGHT, self.rows.len(), |ui, row_range| {
                            for row in &self.rows[row_range] {
                                let color = match row.user.kind {
                                    UserKind::Matched => palette.success,
                                    UserKind::Unmatched => palette.warning,
                                };
                                let selected = self.selected == Some(row.user);
                                let text = row_text(&row.id, &row.email, &row.name, &row.points);
                                if ui
                                    .selectable_label(
                                        selected,
                                        RichText::new(text).monospace().color(color),
                                    )
                                    .clicked()
                                {
                                    clicked = Some(row.user);
                                }
                            }
                        });
                });

            if let Some(user) = clicked {
                self.select(user);
            }

            ui.label(
                RichText::new(format!("{} users", format_thousands(self.rows.len() as u64)))
                    .size(11.0)
                    .color(palette.text_secondary),
            );
        });
    }

    fn show_details(&mut self, ui: &mut egui::Ui, palette: &Palette) {
        card(ui, palette, |ui| {
            heading(ui, "📄 User Details");
            if self.details.is_empty() {
                ui.label(
                    RichText::new("Select a user to see their details")
                        .color(palette.text_secondary),
                );
                return;
            }

            ScrollArea::vertical()
                .id_salt("user_details")
                .max_height(LIST_HEIGHT)
                .show(ui, |ui| {
                    ui.label(RichText::new(&self.details).monospace());
                });

            if let Some(chart) = &self.timeline {
                ui.add_space(8.0);
                ui.label(RichText::new(&chart.title).strong());
                ChartPlotter::draw(ui, chart, &[palette.primary], CHART_HEIGHT);
            }
        });
    }

    fn show_summary(&self, ui: &mut egui::Ui, palette: &Palette) {
        if self.summary.is_empty() {
            return;
        }
        card(ui, palette, |ui| {
            heading(ui, "📊 Summary & Visualizations");
            ui.horizontal_top(|ui| {
                ui.label(RichText::new(&self.summary).monospace());
                ui.add_space(20.0);
                ui.columns(2, |cols| {
                    if let Some(chart) = &self.status_chart {
                        cols[0].label(RichText::new(&chart.title).strong());
                        ChartPlotter::draw(
                            &mut cols[0],
                            chart,
                            &[palette.success, palette.warning],
                            CHART_HEIGHT,
                        );
                    }
                    if let Some(chart) = &self.source_chart {
                        cols[1].label(RichText::new(&chart.title).strong());
                        ChartPlotter::draw(
                            &mut cols[1],
                            chart,
                            &[palette.primary, palette.info],
                            CHART_HEIGHT,
                        );
                    }
                });
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_has_no_status_chart() {
        assert!(match_status_chart(&SyncReport::default()).is_none());

        let report = SyncReport {
            total_clerk_users: 10,
            total_convex_users: 8,
            matched_users: 7,
            clerk_only: 3,
            convex_only: 1,
            ..Default::default()
        };
        match match_status_chart(&report).unwrap().series {
            ChartSeries::Categories { counts, .. } => assert_eq!(counts, vec![7.0, 4.0]),
            other => panic!("unexpected series {:?}", other),
        }
        match source_chart(&report).series {
            ChartSeries::Categories { labels, counts } => {
                assert_eq!(labels, vec!["Clerk", "Convex"]);
                assert_eq!(counts, vec![10.0, 8.0]);
            }
            other => panic!("unexpected series {:?}", other),
        }
    }

    #[test]
    fn blank_paths_are_skipped() {
        assert_eq!(optional_path("  "), None);
        assert_eq!(optional_path(" out/a.jsonl "), Some(PathBuf::from("out/a.jsonl")));
    }
}
