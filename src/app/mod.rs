//! App module - contains the main application state and logic

mod chat;
mod history;
mod login;
mod password;
mod register;
mod splash;

use crate::constants::*;
use crate::db::Database;
use crate::ollama::OllamaClient;
use crate::cloud::{CloudAuth, PromptStore};
use crate::settings::Settings;
use crate::theme;
use crate::types::*;
use eframe::egui;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub(crate) db: Database,
    pub(crate) settings: Settings,
    pub(crate) data_dir: PathBuf,
    pub(crate) runtime: tokio::runtime::Runtime,
    pub(crate) screen: Screen,

    // Splash
    pub(crate) splash_start: std::time::Instant,
    pub(crate) logo_texture: Option<egui::TextureHandle>,

    // Profile / cloud session
    pub(crate) profile_name: Option<String>,
    pub(crate) session: Arc<Mutex<Option<Session>>>,

    // Login screen
    pub(crate) login_input: String,
    pub(crate) password_input: String,
    pub(crate) remember_login: bool,
    pub(crate) login_flow: Arc<Mutex<AuthFlow>>,
    pub(crate) reset_flow: Arc<Mutex<AuthFlow>>,

    // Registration screen
    pub(crate) register_fields: [String; 8],

    // Password setup screen
    pub(crate) setup_login: String,
    pub(crate) setup_password: String,
    pub(crate) setup_confirm: String,
    pub(crate) signup_flow: Arc<Mutex<AuthFlow>>,

    // Chat screen
    pub(crate) prompt_input: String,
    pub(crate) chat_state: Arc<Mutex<ChatState>>,
    pub(crate) cancel_token: Option<CancellationToken>,
    pub(crate) show_drawer: bool,
    pub(crate) endpoint_health: Arc<Mutex<EndpointHealth>>,
    pub(crate) health_checked: bool,
    pub(crate) models: Arc<Mutex<ModelsState>>,

    // History screen
    pub(crate) history: Arc<Mutex<HistoryState>>,

    // Toast notification
    pub(crate) toast_message: Option<String>,
    pub(crate) toast_start: Option<std::time::Instant>,
    pub(crate) central_panel_rect: Option<egui::Rect>,

    // Window geometry
    pub(crate) window_pos: Option<egui::Pos2>,
    pub(crate) window_size: Option<egui::Vec2>,
    pub(crate) needs_center: bool,
}

// ============================================================================
// APP INITIALIZATION & HELPERS
// ============================================================================

impl App {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        db: Database,
        settings: Settings,
        data_dir: PathBuf,
    ) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);

        // Add Phosphor icons font
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        theme::apply_visuals(&cc.egui_ctx);

        let login_input = if settings.remember_login {
            settings.saved_login.clone().unwrap_or_default()
        } else {
            String::new()
        };
        let remember_login = settings.remember_login;

        Self {
            db,
            settings,
            data_dir,
            runtime: tokio::runtime::Runtime::new().unwrap(),
            screen: Screen::Splash,
            splash_start: std::time::Instant::now(),
            logo_texture: None,
            profile_name: None,
            session: Arc::new(Mutex::new(None)),
            login_input,
            password_input: String::new(),
            remember_login,
            login_flow: Arc::new(Mutex::new(AuthFlow::default())),
            reset_flow: Arc::new(Mutex::new(AuthFlow::default())),
            register_fields: Default::default(),
            setup_login: String::new(),
            setup_password: String::new(),
            setup_confirm: String::new(),
            signup_flow: Arc::new(Mutex::new(AuthFlow::default())),
            prompt_input: String::new(),
            chat_state: Arc::new(Mutex::new(ChatState::default())),
            cancel_token: None,
            show_drawer: false,
            endpoint_health: Arc::new(Mutex::new(EndpointHealth::Unknown)),
            health_checked: false,
            models: Arc::new(Mutex::new(ModelsState::default())),
            history: Arc::new(Mutex::new(HistoryState::default())),
            toast_message: None,
            toast_start: None,
            central_panel_rect: None,
            window_pos: None,
            window_size: None,
            needs_center: false,
        }
    }

    // ------------------------------------------------------------------
    // Clients (constructed per task from the current settings)
    // ------------------------------------------------------------------

    pub(crate) fn ollama_client(&self) -> OllamaClient {
        OllamaClient::new(self.settings.ollama_url_or_default(), &self.settings.model)
    }

    pub(crate) fn cloud_auth(&self) -> Option<CloudAuth> {
        self.settings.cloud_api_key.as_ref().map(CloudAuth::new)
    }

    pub(crate) fn prompt_store(&self) -> Option<PromptStore> {
        self.settings.cloud_project.as_ref().map(PromptStore::new)
    }

    /// Background tasks open their own connection at this path.
    pub(crate) fn db_path(&self) -> PathBuf {
        self.data_dir.join("textai.db")
    }

    pub(crate) fn current_session(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub(crate) fn navigate(&mut self, screen: Screen, ctx: &egui::Context) {
        debug!(from = ?self.screen, to = ?screen, "Navigating");
        self.screen = screen;
        match screen {
            Screen::Chat => {
                if let Ok(Some(profile)) = self.db.get_profile(PROFILE_ID) {
                    self.profile_name = Some(profile.name);
                }
                let name = self
                    .profile_name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| "visitante".to_string());
                {
                    let mut state = self.chat_state.lock().unwrap();
                    if state.response.is_empty() && !state.generating {
                        state.response =
                            format!("{}, {}!\n{}", WELCOME_PART_ONE, name, WELCOME_PART_TWO);
                    }
                }
                if !self.health_checked {
                    self.health_checked = true;
                    self.refresh_endpoint_status(ctx);
                    self.refresh_models(ctx);
                }
            }
            Screen::History => self.load_history(ctx),
            _ => {}
        }
    }

    pub(crate) fn sign_out(&mut self, ctx: &egui::Context) {
        info!("Signing out");
        *self.session.lock().unwrap() = None;
        self.settings.remember_login = false;
        self.settings.saved_login = None;
        self.settings.save(&self.data_dir);
        self.remember_login = false;
        self.login_input.clear();
        self.password_input.clear();
        self.show_drawer = false;
        *self.history.lock().unwrap() = HistoryState::default();
        self.navigate(Screen::Login, ctx);
    }

    // ------------------------------------------------------------------
    // Background flow results, polled every frame
    // ------------------------------------------------------------------

    pub(crate) fn poll_flows(&mut self, ctx: &egui::Context) {
        let outcome = self.login_flow.lock().unwrap().outcome.take();
        if let Some(outcome) = outcome {
            self.show_toast(&outcome.message);
            if outcome.ok {
                if let Some(session) = outcome.session {
                    *self.session.lock().unwrap() = Some(session);
                }
                if self.remember_login {
                    self.settings.remember_login = true;
                    self.settings.saved_login = Some(self.login_input.trim().to_string());
                } else {
                    self.settings.remember_login = false;
                    self.settings.saved_login = None;
                }
                self.settings.save(&self.data_dir);
                self.password_input.clear();
                self.navigate(Screen::Chat, ctx);
            }
        }

        let outcome = self.signup_flow.lock().unwrap().outcome.take();
        if let Some(outcome) = outcome {
            self.show_toast(&outcome.message);
            if outcome.ok {
                if let Some(session) = outcome.session {
                    *self.session.lock().unwrap() = Some(session);
                }
                self.navigate(Screen::Chat, ctx);
            }
        }

        let outcome = self.reset_flow.lock().unwrap().outcome.take();
        if let Some(outcome) = outcome {
            self.show_toast(&outcome.message);
        }

        let save_result = self.chat_state.lock().unwrap().save_result.take();
        if let Some(result) = save_result {
            match result {
                Ok(_) => self.show_toast("Salvo na nuvem"),
                Err(message) => self.show_toast(&message),
            }
        }

        let history_error = self.history.lock().unwrap().error.take();
        if let Some(error) = history_error {
            self.show_toast(format!("Falha ao carregar: {}", error));
        }
    }

    // ------------------------------------------------------------------
    // Toasts
    // ------------------------------------------------------------------

    pub(crate) fn show_toast(&mut self, message: impl Into<String>) {
        self.toast_message = Some(message.into());
        self.toast_start = Some(std::time::Instant::now());
    }

    pub(crate) fn save_window_settings(&mut self) {
        self.settings.window_x = self.window_pos.map(|p| p.x);
        self.settings.window_y = self.window_pos.map(|p| p.y);
        self.settings.window_w = self.window_size.map(|s| s.x);
        self.settings.window_h = self.window_size.map(|s| s.y);
        self.settings.save(&self.data_dir);
    }
}
