//! Login screen: cloud sign-in first, local hash comparison as fallback

use super::App;
use crate::cloud::{user_message, CloudAuth};
use crate::constants::PROFILE_ID;
use crate::db::Database;
use crate::theme;
use crate::types::{AuthOutcome, Screen};
use crate::ui::components::{labeled_text_field, link_text};
use crate::utils::is_valid_email;
use eframe::egui;
use std::path::PathBuf;
use tracing::{error, info, warn};

impl App {
    pub(crate) fn render_login(&mut self, ctx: &egui::Context) {
        let running = self.login_flow.lock().unwrap().running;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.set_max_width(theme::FORM_MAX_WIDTH);
                let avail = ui.available_height();
                ui.add_space((avail / 2.0 - 180.0).max(24.0));
                ui.add(
                    egui::Label::new(
                        egui::RichText::new("Login")
                            .size(18.0)
                            .color(theme::TEXT_PRIMARY),
                    )
                    .selectable(false),
                );
                ui.add_space(theme::SPACING_XL);

                labeled_text_field(ui, "Usuário", &mut self.login_input, false);
                labeled_text_field(ui, "Senha", &mut self.password_input, true);

                ui.add_space(theme::SPACING_MD);
                if running {
                    ui.add(egui::Spinner::new());
                } else {
                    let enter = ui.add_sized(
                        [ui.available_width(), 32.0],
                        theme::button_accent("Entrar"),
                    );
                    if enter.clicked() {
                        self.submit_login(ctx);
                    }
                }

                ui.add_space(theme::SPACING_MD);
                ui.horizontal(|ui| {
                    ui.checkbox(&mut self.remember_login, "Lembrar login");
                });

                ui.add_space(theme::SPACING_LG);
                if link_text(ui, "Não tem conta? Cadastre-se").clicked() {
                    // Only one local profile can exist
                    if self.db.has_profile(PROFILE_ID).unwrap_or(false) {
                        self.show_toast("Já existe um usuário cadastrado");
                    } else {
                        self.navigate(Screen::Register, ctx);
                    }
                }
                ui.add_space(theme::SPACING_SM);
                if link_text(ui, "Esqueci minha senha").clicked() {
                    self.request_password_reset(ctx);
                }
            });
        });
    }

    pub(crate) fn submit_login(&mut self, ctx: &egui::Context) {
        let login = self.login_input.trim().to_string();
        let password = self.password_input.trim().to_string();
        if login.is_empty() || password.is_empty() {
            self.show_toast("Preencha login e senha");
            return;
        }

        {
            let mut flow = self.login_flow.lock().unwrap();
            if flow.running {
                return;
            }
            flow.running = true;
            flow.outcome = None;
        }
        let flow = self.login_flow.clone();
        let db_path = self.db_path();
        let auth = self.cloud_auth();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let outcome = run_login(db_path, auth, login, password).await;
            let mut f = flow.lock().unwrap();
            f.running = false;
            f.outcome = Some(outcome);
            drop(f);
            ctx.request_repaint();
        });
    }

    fn request_password_reset(&mut self, ctx: &egui::Context) {
        let auth = match self.cloud_auth() {
            Some(auth) => auth,
            None => {
                self.show_toast("Nuvem não configurada");
                return;
            }
        };
        let email = self
            .db
            .get_profile(PROFILE_ID)
            .ok()
            .flatten()
            .map(|p| p.email)
            .unwrap_or_default();
        if email.is_empty() || !is_valid_email(&email) {
            self.show_toast("Email inválido");
            return;
        }

        {
            let mut flow = self.reset_flow.lock().unwrap();
            if flow.running {
                return;
            }
            flow.running = true;
            flow.outcome = None;
        }
        let flow = self.reset_flow.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let outcome = match auth.send_password_reset(&email).await {
                Ok(()) => {
                    info!("Password reset email requested");
                    AuthOutcome {
                        ok: true,
                        message: "Email de redefinição enviado".to_string(),
                        session: None,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Password reset failed");
                    AuthOutcome {
                        ok: false,
                        message: user_message(&e),
                        session: None,
                    }
                }
            };
            let mut f = flow.lock().unwrap();
            f.running = false;
            f.outcome = Some(outcome);
            drop(f);
            ctx.request_repaint();
        });
    }
}

fn fail(message: &str) -> AuthOutcome {
    AuthOutcome {
        ok: false,
        message: message.to_string(),
        session: None,
    }
}

async fn run_login(
    db_path: PathBuf,
    auth: Option<CloudAuth>,
    login: String,
    password: String,
) -> AuthOutcome {
    let db = match Database::open(&db_path) {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "Failed to open database for login");
            return fail("Erro no login");
        }
    };
    let local = match db.get_profile_by_login(&login) {
        Ok(profile) => profile,
        Err(e) => {
            error!(error = %e, "Failed to look up user");
            return fail("Erro no login");
        }
    };

    // Cloud sign-in first when the profile carries a usable email
    if let (Some(auth), Some(profile)) = (&auth, &local) {
        if !profile.email.is_empty() {
            if !is_valid_email(&profile.email) {
                warn!(login = %login, "Stored email is malformed, skipping cloud sign-in");
            } else {
                match auth.sign_in(&profile.email, &password).await {
                    Ok(session) => {
                        if let Err(e) = db.set_cloud_uid_by_login(&login, &session.uid) {
                            warn!(error = %e, "Failed to refresh cloud uid");
                        }
                        info!(login = %login, uid = %session.uid, "Cloud login succeeded");
                        return AuthOutcome {
                            ok: true,
                            message: "Login realizado (nuvem)".to_string(),
                            session: Some(session),
                        };
                    }
                    Err(e) => {
                        warn!(error = %e, "Cloud login failed, falling back to local");
                    }
                }
            }
        }
    }

    // Local fallback: compare against the stored hash
    match db.authenticate(&login, &password) {
        Ok(true) => {
            info!(login = %login, "Local login succeeded");
            AuthOutcome {
                ok: true,
                message: "Login realizado".to_string(),
                session: None,
            }
        }
        Ok(false) => {
            if local.is_some() {
                fail("Senha inválida")
            } else {
                fail("Usuário não encontrado")
            }
        }
        Err(e) => {
            error!(error = %e, "Local authentication failed");
            fail("Erro no login")
        }
    }
}
