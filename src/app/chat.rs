//! Chat screen: prompt input, streamed response view, navigation drawer

use super::App;
use crate::cloud::{user_message, PromptRecord};
use crate::constants::ROLE_PROMPT;
use crate::theme;
use crate::types::{EndpointHealth, Screen};
use crate::ui::components::{avatar_circle, drawer_item, health_dot, icon_button};
use crate::utils::filter_invalid_chars;
use chrono::Utc;
use eframe::egui;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

impl App {
    pub(crate) fn render_chat(&mut self, ctx: &egui::Context) {
        self.render_chat_header(ctx);
        if self.show_drawer {
            self.render_drawer(ctx);
        }

        let (response_text, generating, chat_error) = {
            let state = self.chat_state.lock().unwrap();
            (state.response.clone(), state.generating, state.error.clone())
        };

        egui::CentralPanel::default().show(ctx, |ui| {
            let input_height = theme::INPUT_AREA_HEIGHT;
            let response_height = (ui.available_height() - input_height - 16.0).max(80.0);

            // Response area
            theme::card_frame().show(ui, |ui| {
                ui.set_min_height(response_height);
                ui.set_max_height(response_height);
                egui::ScrollArea::vertical()
                    .id_salt("chat_response")
                    .stick_to_bottom(true)
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        if let Some(error) = &chat_error {
                            ui.add(
                                egui::Label::new(
                                    egui::RichText::new(error)
                                        .size(theme::FONT_BODY)
                                        .color(theme::STATUS_ERROR),
                                )
                                .wrap(),
                            );
                        } else {
                            ui.add(
                                egui::Label::new(
                                    egui::RichText::new(&response_text)
                                        .size(theme::FONT_BODY)
                                        .color(theme::TEXT_SECONDARY),
                                )
                                .wrap(),
                            );
                        }
                        if generating {
                            ui.horizontal(|ui| {
                                ui.add(egui::Spinner::new().size(14.0));
                                if ui
                                    .add(
                                        egui::Button::new(
                                            egui::RichText::new("Cancelar")
                                                .size(theme::FONT_SMALL)
                                                .color(theme::TEXT_MUTED),
                                        )
                                        .frame(false),
                                    )
                                    .clicked()
                                {
                                    self.cancel_generation();
                                }
                            });
                        }
                    });
            });

            ui.add_space(theme::SPACING_MD);

            // Prompt input with clear / send actions
            theme::input_frame().show(ui, |ui| {
                ui.horizontal(|ui| {
                    let button_col = 36.0;
                    ui.add_sized(
                        [ui.available_width() - button_col, input_height - 20.0],
                        egui::TextEdit::multiline(&mut self.prompt_input)
                            .frame(false)
                            .hint_text("Digite sua pergunta...")
                            .desired_rows(3),
                    );
                    ui.vertical(|ui| {
                        if icon_button(ui, egui_phosphor::regular::ARROW_CLOCKWISE, 16.0).clicked()
                            && !self.prompt_input.is_empty()
                        {
                            self.prompt_input.clear();
                        }
                        let send =
                            icon_button(ui, egui_phosphor::regular::PAPER_PLANE_RIGHT, 18.0);
                        if send.clicked() && !generating {
                            self.send_prompt(ctx);
                        }
                    });
                });
            });
        });
    }

    fn render_chat_header(&mut self, ctx: &egui::Context) {
        let health = *self.endpoint_health.lock().unwrap();
        egui::TopBottomPanel::top("chat_header")
            .exact_height(theme::HEADER_HEIGHT)
            .frame(
                egui::Frame::new()
                    .fill(theme::BG_ELEVATED)
                    .inner_margin(egui::Margin::symmetric(8, 6)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    if icon_button(ui, egui_phosphor::regular::LIST, 18.0).clicked() {
                        self.show_drawer = !self.show_drawer;
                    }
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new("TextAI")
                                .size(16.0)
                                .color(theme::TEXT_PRIMARY),
                        )
                        .selectable(false),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        health_dot(ui, health);
                        ui.add(
                            egui::Label::new(
                                egui::RichText::new(&self.settings.model)
                                    .size(theme::FONT_SMALL)
                                    .color(theme::TEXT_DIM),
                            )
                            .selectable(false),
                        );
                    });
                });
            });
    }

    fn render_drawer(&mut self, ctx: &egui::Context) {
        let display_name = {
            let session = self.session.lock().unwrap();
            match (&self.profile_name, session.as_ref()) {
                (Some(name), _) if !name.trim().is_empty() => name.clone(),
                (_, Some(session)) => session.uid.clone(),
                _ => "Não autenticado".to_string(),
            }
        };
        let (model_names, models_loading, models_error) = {
            let models = self.models.lock().unwrap();
            (
                models.names.clone(),
                models.loading,
                models.error.clone(),
            )
        };

        egui::SidePanel::left("drawer")
            .exact_width(theme::DRAWER_WIDTH)
            .resizable(false)
            .frame(
                egui::Frame::new()
                    .fill(theme::BG_ELEVATED)
                    .inner_margin(egui::Margin::same(12)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    avatar_circle(ui, &display_name);
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new(&display_name)
                                .size(theme::FONT_BODY)
                                .color(theme::TEXT_PRIMARY),
                        )
                        .selectable(false),
                    );
                });
                ui.add_space(theme::SPACING_XL);

                if drawer_item(ui, egui_phosphor::regular::CHAT_TEXT, "Meus Prompts") {
                    self.show_drawer = false;
                    self.navigate(Screen::History, ctx);
                }

                ui.add_space(theme::SPACING_LG);
                ui.horizontal(|ui| {
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new("MODELOS")
                                .size(theme::FONT_SMALL)
                                .color(theme::TEXT_DIM),
                        )
                        .selectable(false),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if icon_button(ui, egui_phosphor::regular::ARROWS_CLOCKWISE, 13.0)
                            .clicked()
                        {
                            self.refresh_models(ctx);
                            self.refresh_endpoint_status(ctx);
                        }
                    });
                });
                if models_loading {
                    ui.add(egui::Spinner::new().size(14.0));
                } else if let Some(error) = models_error {
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new(error)
                                .size(theme::FONT_SMALL)
                                .color(theme::TEXT_DIM),
                        )
                        .wrap(),
                    );
                } else {
                    for name in model_names {
                        let selected = name == self.settings.model;
                        let icon = if selected {
                            egui_phosphor::regular::CHECK_CIRCLE
                        } else {
                            egui_phosphor::regular::CIRCLE
                        };
                        if drawer_item(ui, icon, &name) && !selected {
                            info!(model = %name, "Model selected");
                            self.settings.model = name;
                            self.settings.save(&self.data_dir);
                        }
                    }
                }

                ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
                    ui.add_space(theme::SPACING_MD);
                    if drawer_item(ui, egui_phosphor::regular::SIGN_OUT, "Sair") {
                        self.sign_out(ctx);
                    }
                });
            });
    }

    // ------------------------------------------------------------------
    // Generation
    // ------------------------------------------------------------------

    pub(crate) fn send_prompt(&mut self, ctx: &egui::Context) {
        let prompt = self.prompt_input.trim().to_string();
        if prompt.is_empty() {
            return;
        }
        {
            let mut state = self.chat_state.lock().unwrap();
            if state.generating {
                return;
            }
            state.generating = true;
            state.response.clear();
            state.error = None;
            state.save_result = None;
        }
        self.prompt_input.clear();

        let tuned_prompt = format!("{}\n\n{}", ROLE_PROMPT, prompt);
        let client = self.ollama_client();
        let stream = self.settings.stream_responses;
        let state = self.chat_state.clone();
        let session = self.current_session();
        let store = self.prompt_store();
        let token = CancellationToken::new();
        self.cancel_token = Some(token.clone());
        let ctx = ctx.clone();

        info!(chars = prompt.len(), stream = stream, "Sending prompt");
        self.runtime.spawn(async move {
            let result = if stream {
                let state_cb = state.clone();
                let ctx_cb = ctx.clone();
                client
                    .generate_streamed(&tuned_prompt, &token, move |fragment| {
                        let mut s = state_cb.lock().unwrap();
                        s.response.push_str(fragment);
                        drop(s);
                        ctx_cb.request_repaint();
                    })
                    .await
            } else {
                client.generate(&tuned_prompt).await
            };

            match result {
                Ok(text) => {
                    let cleaned = filter_invalid_chars(&text).to_string();
                    {
                        let mut s = state.lock().unwrap();
                        s.response = cleaned.clone();
                        s.generating = false;
                    }
                    ctx.request_repaint();

                    if token.is_cancelled() {
                        // Aborted mid-stream: keep the partial text, skip the save
                        return;
                    }

                    match (store, session) {
                        (Some(store), Some(session)) => {
                            let record = PromptRecord {
                                id: String::new(),
                                user_id: session.uid.clone(),
                                prompt,
                                response: cleaned,
                                created_at: Some(Utc::now()),
                            };
                            let saved = store.save_prompt(&session, &record).await;
                            let mut s = state.lock().unwrap();
                            s.save_result = Some(match saved {
                                Ok(id) => Ok(id),
                                Err(e) => {
                                    warn!(error = %e, "Failed to save prompt");
                                    Err(format!("Falha ao salvar: {}", user_message(&e)))
                                }
                            });
                        }
                        _ => {
                            let mut s = state.lock().unwrap();
                            s.save_result = Some(Err(
                                "Não autenticado na nuvem; não foi possível salvar".to_string(),
                            ));
                        }
                    }
                    ctx.request_repaint();
                }
                Err(e) => {
                    error!(error = %e, "Generation request failed");
                    let mut s = state.lock().unwrap();
                    s.generating = false;
                    s.error = Some(
                        "Não foi possível obter resposta do servidor de inferência".to_string(),
                    );
                    drop(s);
                    ctx.request_repaint();
                }
            }
        });
    }

    pub(crate) fn cancel_generation(&mut self) {
        if let Some(token) = &self.cancel_token {
            info!("Cancelling generation");
            token.cancel();
        }
    }

    // ------------------------------------------------------------------
    // Endpoint probes
    // ------------------------------------------------------------------

    pub(crate) fn refresh_endpoint_status(&mut self, ctx: &egui::Context) {
        *self.endpoint_health.lock().unwrap() = EndpointHealth::Checking;
        let client = self.ollama_client();
        let health = self.endpoint_health.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let up = client.status().await;
            *health.lock().unwrap() = if up {
                EndpointHealth::Up
            } else {
                EndpointHealth::Down
            };
            ctx.request_repaint();
        });
    }

    pub(crate) fn refresh_models(&mut self, ctx: &egui::Context) {
        {
            let mut models = self.models.lock().unwrap();
            if models.loading {
                return;
            }
            models.loading = true;
            models.error = None;
        }
        let client = self.ollama_client();
        let models = self.models.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let result = client.list_models().await;
            let mut m = models.lock().unwrap();
            m.loading = false;
            match result {
                Ok(names) => m.names = names,
                Err(e) => {
                    warn!(error = %e, "Failed to list models");
                    m.error = Some("Não foi possível listar os modelos".to_string());
                }
            }
            drop(m);
            ctx.request_repaint();
        });
    }
}
