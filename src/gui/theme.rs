//! Light / dark palettes and their egui visuals.

use crate::config::ThemeMode;
use egui::{Color32, Stroke, Visuals};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub primary: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub error: Color32,
    pub info: Color32,
    pub bg_primary: Color32,
    pub bg_secondary: Color32,
    pub border: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
}

impl Palette {
    pub const LIGHT: Palette = Palette {
        primary: Color32::from_rgb(0x25, 0x63, 0xeb),
        success: Color32::from_rgb(0x10, 0xb9, 0x81),
        warning: Color32::from_rgb(0xf5, 0x9e, 0x0b),
        error: Color32::from_rgb(0xef, 0x44, 0x44),
        info: Color32::from_rgb(0x3b, 0x82, 0xf6),
        bg_primary: Color32::from_rgb(0xff, 0xff, 0xff),
        bg_secondary: Color32::from_rgb(0xf8, 0xfa, 0xfc),
        border: Color32::from_rgb(0xe2, 0xe8, 0xf0),
        text_primary: Color32::from_rgb(0x1e, 0x29, 0x3b),
        text_secondary: Color32::from_rgb(0x64, 0x74, 0x8b),
    };

    pub const DARK: Palette = Palette {
        primary: Color32::from_rgb(0x3b, 0x82, 0xf6),
        success: Color32::from_rgb(0x10, 0xb9, 0x81),
        warning: Color32::from_rgb(0xf5, 0x9e, 0x0b),
        error: Color32::from_rgb(0xef, 0x44, 0x44),
        info: Color32::from_rgb(0x60, 0xa5, 0xfa),
        bg_primary: Color32::from_rgb(0x0f, 0x17, 0x2a),
        bg_secondary: Color32::from_rgb(0x1e, 0x29, 0x3b),
        border: Color32::from_rgb(0x47, 0x55, 0x69),
        text_primary: Color32::from_rgb(0xf1, 0xf5, 0xf9),
        text_secondary: Color32::from_rgb(0xcb, 0xd5, 0xe1),
    };

    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::LIGHT,
            ThemeMode::Dark => Self::DARK,
        }
    }

    /// Series colors for charts, starting with the accent colors.
    pub fn chart_colors(&self) -> Vec<Color32> {
        vec![
            self.primary,
            self.success,
            self.warning,
            self.error,
            self.info,
        ]
    }

    pub fn visuals(&self, mode: ThemeMode) -> Visuals {
        let mut visuals = match mode {
            ThemeMode::Light => Visuals::light(),
            ThemeMode::Dark => Visuals::dark(),
        };
        visuals.panel_fill = self.bg_primary;
        visuals.window_fill = self.bg_primary;
        visuals.extreme_bg_color = self.bg_secondary;
        visuals.faint_bg_color = self.bg_secondary;
        visuals.override_text_color = Some(self.text_primary);
        visuals.hyperlink_color = self.primary;
        visuals.selection.bg_fill = self.primary;
        visuals.selection.stroke = Stroke::new(1.0, self.text_primary);
        visuals.widgets.noninteractive.bg_fill = self.bg_secondary;
        visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, self.border);
        visuals.error_fg_color = self.error;
        visuals.warn_fg_color = self.warning;
        visuals
    }

    pub fn apply(&self, ctx: &egui::Context, mode: ThemeMode) {
        ctx.set_visuals(self.visuals(mode));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_follow_mode() {
        assert_eq!(Palette::for_mode(ThemeMode::Light).primary, Color32::from_rgb(37, 99, 235));
        assert_eq!(Palette::for_mode(ThemeMode::Dark).bg_primary, Color32::from_rgb(15, 23, 42));
    }

    #[test]
    fn visuals_use_palette() {
        let visuals = Palette::DARK.visuals(ThemeMode::Dark);
        assert!(visuals.dark_mode);
        assert_eq!(visuals.panel_fill, Palette::DARK.bg_primary);
        assert_eq!(visuals.override_text_color, Some(Palette::DARK.text_primary));
    }
}
