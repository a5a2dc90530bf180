//! Small shared widgets: cards, stat cards and file path rows.

use crate::gui::theme::Palette;
use egui::{Color32, RichText};

/// Rounded panel with the secondary background.
pub fn card<R>(
    ui: &mut egui::Ui,
    palette: &Palette,
    add_contents: impl FnOnce(&mut egui::Ui) -> R,
) -> R {
    egui::Frame::none()
        .fill(palette.bg_secondary)
        .stroke(egui::Stroke::new(1.0, palette.border))
        .rounding(8.0)
        .inner_margin(12.0)
        .show(ui, add_contents)
        .inner
}

/// Section heading inside a card.
pub fn heading(ui: &mut egui::Ui, text: &str) {
    ui.label(RichText::new(text).size(15.0).strong());
    ui.add_space(6.0);
}

/// A headline number with a caption, accent colored.
pub fn stat_card(ui: &mut egui::Ui, palette: &Palette, title: &str, value: &str, accent: Color32) {
    egui::Frame::none()
        .fill(palette.bg_secondary)
        .stroke(egui::Stroke::new(2.0, accent))
        .rounding(8.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.set_min_width(180.0);
            ui.vertical(|ui| {
                ui.label(
                    RichText::new(title)
                        .size(12.0)
                        .color(palette.text_secondary),
                );
                ui.label(RichText::new(value).size(26.0).strong().color(accent));
            });
        });
}

/// `label [path........] [Browse]`. Returns true when Browse was clicked.
pub fn path_row(ui: &mut egui::Ui, label: &str, path: &mut String, label_width: f32) -> bool {
    let mut browse = false;
    ui.horizontal(|ui| {
        ui.add_sized([label_width, 20.0], egui::Label::new(label));
        let field_width = (ui.available_width() - 100.0).max(120.0);
        ui.add(egui::TextEdit::singleline(path).desired_width(field_width));
        if ui.button("📂 Browse").clicked() {
            browse = true;
        }
    });
    browse
}

/// Status line colored by its leading mark.
pub fn status_label(ui: &mut egui::Ui, palette: &Palette, status: &str) {
    let color = if status.starts_with('✓') {
        palette.success
    } else if status.starts_with('✗') {
        palette.error
    } else {
        palette.text_secondary
    };
    ui.label(RichText::new(status).size(12.0).color(color));
}

/// Native error dialog.
pub fn show_error(message: &str) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title("Error")
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}
