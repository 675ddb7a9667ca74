//! Transcript history screen, backed by the cloud store

use super::App;
use crate::cloud::user_message;
use crate::theme;
use crate::types::Screen;
use crate::ui::components::icon_button;
use crate::utils::format_timestamp;
use eframe::egui;
use tracing::debug;

impl App {
    pub(crate) fn render_history(&mut self, ctx: &egui::Context) {
        let (records, loading, loaded) = {
            let history = self.history.lock().unwrap();
            (history.records.clone(), history.loading, history.loaded)
        };

        egui::TopBottomPanel::top("history_header")
            .exact_height(theme::HEADER_HEIGHT)
            .frame(
                egui::Frame::new()
                    .fill(theme::BG_ELEVATED)
                    .inner_margin(egui::Margin::symmetric(8, 6)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    if icon_button(ui, egui_phosphor::regular::CARET_LEFT, 18.0).clicked() {
                        self.navigate(Screen::Chat, ctx);
                    }
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new("Histórico de prompts")
                                .size(16.0)
                                .color(theme::TEXT_PRIMARY),
                        )
                        .selectable(false),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if icon_button(ui, egui_phosphor::regular::ARROWS_CLOCKWISE, 16.0)
                            .clicked()
                        {
                            self.load_history(ctx);
                        }
                    });
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(32.0);
                    ui.add(egui::Spinner::new());
                });
                return;
            }
            if loaded && records.is_empty() {
                ui.vertical_centered(|ui| {
                    ui.add_space(32.0);
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new("Nenhum prompt salvo ainda")
                                .color(theme::TEXT_DIM),
                        )
                        .selectable(false),
                    );
                });
                return;
            }

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    for record in &records {
                        theme::card_frame().show(ui, |ui| {
                            ui.set_width(ui.available_width());
                            ui.add(
                                egui::Label::new(
                                    egui::RichText::new("Prompt:")
                                        .size(theme::FONT_SMALL)
                                        .color(theme::TEXT_DIM),
                                )
                                .selectable(false),
                            );
                            ui.add(
                                egui::Label::new(
                                    egui::RichText::new(&record.prompt)
                                        .size(theme::FONT_BODY)
                                        .color(theme::TEXT_PRIMARY),
                                )
                                .wrap(),
                            );
                            ui.add_space(theme::SPACING_SM);
                            ui.add(
                                egui::Label::new(
                                    egui::RichText::new("Resposta:")
                                        .size(theme::FONT_SMALL)
                                        .color(theme::TEXT_DIM),
                                )
                                .selectable(false),
                            );
                            ui.add(
                                egui::Label::new(
                                    egui::RichText::new(&record.response)
                                        .size(theme::FONT_SMALL)
                                        .color(theme::TEXT_SECONDARY),
                                )
                                .wrap(),
                            );
                            if let Some(created_at) = &record.created_at {
                                ui.add_space(theme::SPACING_SM);
                                ui.add(
                                    egui::Label::new(
                                        egui::RichText::new(format_timestamp(created_at))
                                            .size(theme::FONT_SMALL)
                                            .color(theme::TEXT_DIM),
                                    )
                                    .selectable(false),
                                );
                            }
                        });
                        ui.add_space(theme::SPACING_MD);
                    }
                });
        });
    }

    pub(crate) fn load_history(&mut self, ctx: &egui::Context) {
        let session = match self.current_session() {
            Some(session) => session,
            None => {
                self.show_toast("Usuário não autenticado");
                return;
            }
        };
        let store = match self.prompt_store() {
            Some(store) => store,
            None => {
                self.show_toast("Nuvem não configurada");
                return;
            }
        };
        {
            let mut history = self.history.lock().unwrap();
            if history.loading {
                return;
            }
            history.loading = true;
            history.error = None;
        }

        debug!(uid = %session.uid, "Loading prompt history");
        let history = self.history.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let result = store.list_prompts(&session).await;
            let mut h = history.lock().unwrap();
            h.loading = false;
            h.loaded = true;
            match result {
                Ok(records) => h.records = records,
                Err(e) => h.error = Some(user_message(&e)),
            }
            drop(h);
            ctx.request_repaint();
        });
    }
}
