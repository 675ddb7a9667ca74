#![windows_subsystem = "windows"]
//! TextAI - Main entry point

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod app;
mod cloud;
mod constants;
mod db;
mod ollama;
mod settings;
mod theme;
mod types;
mod ui;
mod utils;

use app::App;
use constants::APP_VERSION;
use db::Database;
use eframe::egui;
use tracing::{error, info};
use types::Screen;

/// Initialize file logging. Returns a guard that must be held for the app lifetime.
fn init_logging(data_dir: &std::path::Path) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let logs_dir = data_dir.join("logs");
    std::fs::create_dir_all(&logs_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "textai.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,textai=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    guard
}

fn main() -> eframe::Result<()> {
    let data_dir = utils::get_data_dir();
    std::fs::create_dir_all(&data_dir).ok();

    // Initialize logging - guard must live for entire app lifetime
    let _log_guard = init_logging(&data_dir);

    info!(version = APP_VERSION, "TextAI starting");

    let db_path = data_dir.join("textai.db");
    let db = match Database::open(&db_path) {
        Ok(db) => {
            info!(path = %db_path.display(), "Database opened");
            db
        }
        Err(e) => {
            error!(error = %e, path = %db_path.display(), "Failed to open database");
            panic!("Failed to open database: {}", e);
        }
    };

    // Load saved window position/size
    let settings = settings::Settings::load(&data_dir);
    let win_pos = match (settings.window_x, settings.window_y) {
        (Some(x), Some(y)) => Some(egui::pos2(x, y)),
        _ => None,
    };
    let win_size = match (settings.window_w, settings.window_h) {
        (Some(w), Some(h)) => Some(egui::vec2(w, h)),
        _ => None,
    };

    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size(win_size.unwrap_or(egui::vec2(480.0, 760.0)))
        .with_min_inner_size([420.0, 640.0])
        .with_title("TextAI");

    // Window/taskbar icon rasterized from the inline logo
    {
        let (pixels, w, h) = utils::rasterize_logo(64);
        let icon = egui::IconData {
            rgba: pixels,
            width: w,
            height: h,
        };
        viewport = viewport.with_icon(std::sync::Arc::new(icon));
    }

    let needs_center = win_pos.is_none();

    if let Some(pos) = win_pos {
        viewport = viewport.with_position(pos);
    }

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "TextAI",
        options,
        Box::new(move |cc| {
            let mut app = App::new(cc, db, settings, data_dir);
            app.needs_center = needs_center;
            Ok(Box::new(app))
        }),
    )
}

// ============================================================================
// MAIN UPDATE LOOP
// ============================================================================

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Track window position/size for saving on exit
        ctx.input(|i| {
            if let Some(rect) = i.viewport().outer_rect {
                self.window_pos = Some(rect.min);
            }
            if let Some(rect) = i.viewport().inner_rect {
                self.window_size = Some(rect.size());
            }
        });

        // Center window on first launch
        if self.needs_center {
            self.needs_center = false;
            if let Some(cmd) = egui::ViewportCommand::center_on_screen(ctx) {
                ctx.send_viewport_cmd(cmd);
            }
        }

        // Collect results from background tasks
        self.poll_flows(ctx);

        match self.screen {
            Screen::Splash => self.render_splash(ctx),
            Screen::Register => self.render_register(ctx),
            Screen::PasswordSetup => self.render_password_setup(ctx),
            Screen::Login => self.render_login(ctx),
            Screen::Chat => self.render_chat(ctx),
            Screen::History => self.render_history(ctx),
        }

        self.central_panel_rect = Some(ctx.screen_rect());
        self.render_toast(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Shutting down, saving settings");
        self.save_window_settings();
    }
}

impl App {
    /// Toast notification: bottom-right, 3s visible then fade, pause on hover
    fn render_toast(&mut self, ctx: &egui::Context) {
        if let (Some(msg), Some(panel_rect)) = (&self.toast_message.clone(), self.central_panel_rect)
        {
            let visible_duration = 3.0;
            let fade_duration = 0.5;
            let total_duration = visible_duration + fade_duration;
            let margin = 12.0;

            let toast_pos = egui::pos2(panel_rect.right() - margin, panel_rect.bottom() - margin);

            let response = egui::Area::new(egui::Id::new("toast"))
                .fixed_pos(toast_pos)
                .pivot(egui::Align2::RIGHT_BOTTOM)
                .show(ctx, |ui| {
                    let elapsed = self
                        .toast_start
                        .map(|t| t.elapsed().as_secs_f32())
                        .unwrap_or(0.0);
                    let alpha = if elapsed > visible_duration {
                        (total_duration - elapsed) / fade_duration
                    } else {
                        1.0
                    };

                    egui::Frame::new()
                        .fill(egui::Color32::from_rgba_unmultiplied(
                            0x1a,
                            0x1a,
                            0x1e,
                            (230.0 * alpha) as u8,
                        ))
                        .stroke(egui::Stroke::new(
                            1.0,
                            egui::Color32::from_rgba_unmultiplied(
                                theme::ACCENT.r(),
                                theme::ACCENT.g(),
                                theme::ACCENT.b(),
                                (100.0 * alpha) as u8,
                            ),
                        ))
                        .corner_radius(6.0)
                        .inner_margin(egui::Margin::symmetric(16, 10))
                        .show(ui, |ui| {
                            ui.label(egui::RichText::new(msg).color(
                                egui::Color32::from_rgba_unmultiplied(
                                    255,
                                    255,
                                    255,
                                    (255.0 * alpha) as u8,
                                ),
                            ));
                        });
                });

            // Pause timer while hovering
            if response.response.hovered() {
                self.toast_start = Some(std::time::Instant::now());
            }

            let elapsed = self
                .toast_start
                .map(|t| t.elapsed().as_secs_f32())
                .unwrap_or(0.0);
            if elapsed >= total_duration {
                self.toast_message = None;
                self.toast_start = None;
            } else {
                ctx.request_repaint();
            }
        }
    }
}
