//! Reusable UI components
//!
//! Standalone widgets shared by the form screens and the chat screen.

use crate::theme;
use crate::types::EndpointHealth;
use crate::utils::initials;
use eframe::egui;

/// Form row: caption above a framed single-line text input
pub fn labeled_text_field(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut String,
    password: bool,
) -> egui::Response {
    ui.add(
        egui::Label::new(
            egui::RichText::new(label)
                .size(theme::FONT_SMALL)
                .color(theme::TEXT_DIM),
        )
        .selectable(false),
    );
    let response = theme::input_frame()
        .show(ui, |ui| {
            ui.add(
                egui::TextEdit::singleline(value)
                    .frame(false)
                    .password(password)
                    .desired_width(ui.available_width()),
            )
        })
        .inner;
    ui.add_space(theme::SPACING_SM);
    response
}

/// Initials avatar inside a filled circle
pub fn avatar_circle(ui: &mut egui::Ui, name: &str) {
    let size = theme::AVATAR_SIZE;
    let (rect, _) = ui.allocate_exact_size(egui::vec2(size, size), egui::Sense::hover());
    if ui.is_rect_visible(rect) {
        let painter = ui.painter();
        painter.circle_filled(rect.center(), size / 2.0, theme::AVATAR_BG);
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            initials(name),
            egui::FontId::proportional(size * 0.38),
            egui::Color32::WHITE,
        );
    }
}

/// Endpoint health dot with a hover hint
pub fn health_dot(ui: &mut egui::Ui, health: EndpointHealth) {
    let (color, hint) = match health {
        EndpointHealth::Up => (theme::STATUS_SUCCESS, "Servidor de inferência disponível"),
        EndpointHealth::Down => (theme::STATUS_ERROR, "Servidor de inferência indisponível"),
        EndpointHealth::Checking => (theme::STATUS_WARNING, "Verificando servidor..."),
        EndpointHealth::Unknown => (theme::TEXT_DIM, "Status desconhecido"),
    };
    let (rect, response) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
    if ui.is_rect_visible(rect) {
        ui.painter().circle_filled(rect.center(), 4.0, color);
    }
    response.on_hover_text(hint);
}

/// Accent-colored clickable text (links like "Cadastre-se")
pub fn link_text(ui: &mut egui::Ui, text: &str) -> egui::Response {
    let response = ui.add(
        egui::Label::new(
            egui::RichText::new(text)
                .color(theme::ACCENT)
                .size(theme::FONT_BODY),
        )
        .sense(egui::Sense::click()),
    );
    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }
    response
}

/// Icon-only button without a frame
pub fn icon_button(ui: &mut egui::Ui, icon: &str, size: f32) -> egui::Response {
    ui.add(
        egui::Button::new(
            egui::RichText::new(icon)
                .size(size)
                .color(theme::TEXT_SECONDARY),
        )
        .frame(false),
    )
}

/// Drawer row with icon + label. Returns true if clicked.
pub fn drawer_item(ui: &mut egui::Ui, icon: &str, label: &str) -> bool {
    let text = format!("{}  {}", icon, label);
    let w = ui.available_width();
    let (rect, response) = ui.allocate_exact_size(egui::vec2(w, 28.0), egui::Sense::click());
    if ui.is_rect_visible(rect) {
        if response.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
            ui.painter()
                .rect_filled(rect, theme::RADIUS_DEFAULT, theme::BG_HOVER);
        }
        ui.painter().text(
            rect.left_center() + egui::vec2(8.0, 0.0),
            egui::Align2::LEFT_CENTER,
            text,
            egui::FontId::proportional(13.0),
            theme::TEXT_SECONDARY,
        );
    }
    response.clicked()
}
