//! Password setup screen: local credentials plus optional cloud sign-up

use super::App;
use crate::cloud::{user_message, CloudAuth};
use crate::constants::PROFILE_ID;
use crate::db::Database;
use crate::theme;
use crate::types::{AuthOutcome, Screen};
use crate::ui::components::labeled_text_field;
use crate::utils::is_valid_email;
use eframe::egui;
use std::path::PathBuf;
use tracing::{error, info, warn};

impl App {
    pub(crate) fn render_password_setup(&mut self, ctx: &egui::Context) {
        let running = self.signup_flow.lock().unwrap().running;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.set_max_width(theme::FORM_MAX_WIDTH);
                let avail = ui.available_height();
                ui.add_space((avail / 2.0 - 160.0).max(24.0));
                ui.add(
                    egui::Label::new(
                        egui::RichText::new("Defina um login (nome de usuário)")
                            .size(18.0)
                            .color(theme::TEXT_PRIMARY),
                    )
                    .selectable(false),
                );
                ui.add_space(theme::SPACING_XL);

                labeled_text_field(ui, "Login", &mut self.setup_login, false);
                labeled_text_field(ui, "Senha", &mut self.setup_password, true);
                labeled_text_field(ui, "Confirmar senha", &mut self.setup_confirm, true);

                ui.add_space(theme::SPACING_XL);
                if running {
                    ui.horizontal(|ui| {
                        ui.add(egui::Spinner::new());
                        ui.add(
                            egui::Label::new(
                                egui::RichText::new("Processando...").color(theme::TEXT_MUTED),
                            )
                            .selectable(false),
                        );
                    });
                } else {
                    let submit = ui.add_sized(
                        [ui.available_width(), 32.0],
                        theme::button_accent("Finalizar cadastro"),
                    );
                    if submit.clicked() {
                        self.submit_credentials(ctx);
                    }
                }
            });
        });
    }

    fn submit_credentials(&mut self, ctx: &egui::Context) {
        let login = self.setup_login.trim().to_string();
        let password = self.setup_password.trim().to_string();
        let confirm = self.setup_confirm.trim().to_string();

        if login.is_empty() || password.is_empty() || confirm.is_empty() {
            self.show_toast("Preencha todos os campos");
            return;
        }
        if password != confirm {
            self.show_toast("Senhas não coincidem");
            return;
        }
        if password.chars().count() < 6 {
            self.show_toast("Senha muito curta (mínimo 6 caracteres)");
            return;
        }

        if let Err(e) = self.db.set_credentials(PROFILE_ID, &login, &password) {
            error!(error = %e, "Failed to store credentials");
            self.show_toast("Erro ao salvar credenciais");
            return;
        }
        info!(login = %login, "Local credentials stored");

        let email = self
            .db
            .get_profile(PROFILE_ID)
            .ok()
            .flatten()
            .map(|p| p.email)
            .unwrap_or_default();

        match self.cloud_auth() {
            Some(auth) if !email.is_empty() => {
                if !is_valid_email(&email) {
                    self.show_toast("Email inválido");
                    return;
                }
                self.spawn_signup(ctx, auth, email, password);
            }
            _ => {
                self.show_toast("Cadastro concluído");
                self.navigate(Screen::Chat, ctx);
            }
        }
    }

    fn spawn_signup(&mut self, ctx: &egui::Context, auth: CloudAuth, email: String, password: String) {
        {
            let mut flow = self.signup_flow.lock().unwrap();
            if flow.running {
                return;
            }
            flow.running = true;
            flow.outcome = None;
        }
        let flow = self.signup_flow.clone();
        let db_path = self.db_path();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let outcome = run_signup(db_path, auth, email, password).await;
            let mut f = flow.lock().unwrap();
            f.running = false;
            f.outcome = Some(outcome);
            drop(f);
            ctx.request_repaint();
        });
    }
}

/// Cloud account creation after the local credentials are already stored.
/// A cloud failure is non-fatal: registration stays complete locally.
async fn run_signup(
    db_path: PathBuf,
    auth: CloudAuth,
    email: String,
    password: String,
) -> AuthOutcome {
    match auth.sign_up(&email, &password).await {
        Ok(session) => {
            match Database::open(&db_path) {
                Ok(db) => {
                    if let Err(e) = db.set_cloud_uid(PROFILE_ID, &session.uid) {
                        warn!(error = %e, "Failed to store cloud uid");
                    }
                }
                Err(e) => warn!(error = %e, "Failed to open database for cloud uid"),
            }
            info!(uid = %session.uid, "Cloud account created");
            AuthOutcome {
                ok: true,
                message: "Cadastro concluído (nuvem ok)".to_string(),
                session: Some(session),
            }
        }
        Err(e) => {
            warn!(error = %e, "Cloud sign-up failed");
            AuthOutcome {
                ok: true,
                message: format!(
                    "Cadastro local concluído. Falha ao criar conta na nuvem: {}",
                    user_message(&e)
                ),
                session: None,
            }
        }
    }
}
