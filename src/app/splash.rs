//! Splash screen shown while the app decides the initial route

use super::App;
use crate::constants::{PROFILE_ID, SPLASH_SECS};
use crate::theme;
use crate::types::Screen;
use crate::utils::rasterize_logo;
use eframe::egui;

impl App {
    pub(crate) fn render_splash(&mut self, ctx: &egui::Context) {
        if self.splash_start.elapsed().as_secs_f32() >= SPLASH_SECS {
            // Profile row present -> login; otherwise first-run registration
            let next = if self.db.has_profile(PROFILE_ID).unwrap_or(false) {
                Screen::Login
            } else {
                Screen::Register
            };
            self.navigate(next, ctx);
            return;
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(theme::BG_BASE))
            .show(ctx, |ui| {
                let texture = self.logo_texture.get_or_insert_with(|| {
                    let (pixels, w, h) = rasterize_logo(256);
                    ctx.load_texture(
                        "logo",
                        egui::ColorImage::from_rgba_unmultiplied(
                            [w as usize, h as usize],
                            &pixels,
                        ),
                        egui::TextureOptions::LINEAR,
                    )
                });

                ui.vertical_centered(|ui| {
                    let avail = ui.available_height();
                    ui.add_space((avail / 2.0 - 100.0).max(0.0));
                    ui.image(egui::load::SizedTexture::new(
                        texture.id(),
                        egui::vec2(128.0, 128.0),
                    ));
                    ui.add_space(theme::SPACING_LG);
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new("TextAI")
                                .size(22.0)
                                .color(theme::TEXT_PRIMARY),
                        )
                        .selectable(false),
                    );
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new("seu assistente pessoal")
                                .size(theme::FONT_SMALL)
                                .color(theme::TEXT_DIM),
                        )
                        .selectable(false),
                    );
                });
            });

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}
