//! Dark theme with a teal accent.

use eframe::egui::{self, Color32, FontId, RichText, TextStyle};

pub const BACKGROUND: Color32 = Color32::from_rgb(0x1E, 0x1E, 0x1E);
pub const TEXT: Color32 = Color32::from_rgb(0xE0, 0xE0, 0xE0);
pub const ACCENT: Color32 = Color32::from_rgb(0x29, 0xA1, 0x9C);
pub const ACCENT_HOVER: Color32 = Color32::from_rgb(0x25, 0x7F, 0x76);
pub const DISABLED: Color32 = Color32::from_rgb(0x55, 0x55, 0x55);
pub const DISABLED_TEXT: Color32 = Color32::from_rgb(0x88, 0x88, 0x88);
pub const FIELD: Color32 = Color32::from_rgb(0x2E, 0x2E, 0x2E);
pub const BORDER: Color32 = Color32::from_rgb(0x44, 0x44, 0x44);

const PROGRESS_HEIGHT: f32 = 15.0;

/// Window-wide visuals. Button colours are applied per button.
fn visuals() -> egui::Visuals {
    let mut visuals = egui::Visuals::dark();
    visuals.panel_fill = BACKGROUND;
    visuals.window_fill = BACKGROUND;
    visuals.override_text_color = Some(TEXT);
    // Caption field background
    visuals.extreme_bg_color = FIELD;
    visuals.selection.bg_fill = ACCENT;

    let border = egui::Stroke::new(1.0, BORDER);
    visuals.widgets.noninteractive.bg_stroke = border;
    // Read-only text edits draw their frame with the inactive stroke.
    visuals.widgets.inactive.bg_stroke = border;
    visuals
}

fn button_visuals(visuals: &mut egui::Visuals) {
    let widgets = &mut visuals.widgets;
    widgets.inactive.weak_bg_fill = ACCENT;
    widgets.inactive.bg_fill = ACCENT;
    widgets.inactive.bg_stroke = egui::Stroke::NONE;
    widgets.hovered.weak_bg_fill = ACCENT_HOVER;
    widgets.hovered.bg_fill = ACCENT_HOVER;
    widgets.hovered.bg_stroke = egui::Stroke::NONE;
    widgets.active.weak_bg_fill = ACCENT_HOVER;
    widgets.active.bg_fill = ACCENT_HOVER;
    widgets.active.bg_stroke = egui::Stroke::NONE;
}

fn progress_visuals(visuals: &mut egui::Visuals) {
    // The progress trough is painted with `extreme_bg_color`.
    visuals.extreme_bg_color = BORDER;
}

/// Install the theme on `ctx`.
pub fn apply(ctx: &egui::Context) {
    ctx.set_visuals(visuals());
    ctx.style_mut(|style| {
        style.spacing.button_padding = egui::vec2(10.0, 10.0);
        style.spacing.item_spacing = egui::vec2(10.0, 10.0);
        style
            .text_styles
            .insert(TextStyle::Button, FontId::proportional(14.0));
        style
            .text_styles
            .insert(TextStyle::Body, FontId::proportional(13.0));
    });
}

/// Full-width action button; greyed out when `enabled` is false.
pub fn action_button(ui: &mut egui::Ui, label: &str, enabled: bool) -> egui::Response {
    ui.scope(|ui| {
        button_visuals(ui.visuals_mut());
        let full = egui::vec2(ui.available_width(), 0.0);
        let text = RichText::new(label).strong();
        let button = if enabled {
            egui::Button::new(text.color(Color32::WHITE))
        } else {
            egui::Button::new(text.color(DISABLED_TEXT)).fill(DISABLED)
        };
        ui.add_enabled(enabled, button.min_size(full))
    })
    .inner
    .on_hover_cursor(egui::CursorIcon::PointingHand)
}

/// Teal bar on a `#444444` trough.
pub fn progress_bar(ui: &mut egui::Ui, fraction: f32, text: String) -> egui::Response {
    ui.scope(|ui| {
        progress_visuals(ui.visuals_mut());
        ui.add(
            egui::ProgressBar::new(fraction)
                .fill(ACCENT)
                .desired_height(PROGRESS_HEIGHT)
                .text(text),
        )
    })
    .inner
}
