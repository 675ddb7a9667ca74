//! Registration screen (personal data form)

use super::App;
use crate::constants::PROFILE_ID;
use crate::db::UserProfile;
use crate::theme;
use crate::types::Screen;
use crate::ui::components::labeled_text_field;
use crate::utils::is_valid_email;
use eframe::egui;
use tracing::{debug, error};

const FIELD_LABELS: [&str; 8] = [
    "Nome", "Idade", "Gênero", "Telefone", "Email", "Cidade", "Estado", "País",
];

impl App {
    pub(crate) fn render_register(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.set_max_width(theme::FORM_MAX_WIDTH);
                    ui.add_space(24.0);
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new("Dados pessoais")
                                .size(18.0)
                                .color(theme::TEXT_PRIMARY),
                        )
                        .selectable(false),
                    );
                    ui.add(
                        egui::Label::new(
                            egui::RichText::new("Preencha seus dados para começar")
                                .size(theme::FONT_SMALL)
                                .color(theme::TEXT_DIM),
                        )
                        .selectable(false),
                    );
                    ui.add_space(theme::SPACING_XL);

                    ui.scope(|ui| {
                        ui.style_mut().spacing.item_spacing.y = 2.0;
                        for (index, label) in FIELD_LABELS.iter().enumerate() {
                            labeled_text_field(ui, label, &mut self.register_fields[index], false);
                        }
                    });

                    ui.add_space(theme::SPACING_XL);
                    let save = ui.add_sized(
                        [ui.available_width(), 32.0],
                        theme::button_accent("Salvar"),
                    );
                    if save.clicked() {
                        self.save_personal_data(ctx);
                    }
                    ui.add_space(24.0);
                });
            });
        });
    }

    fn save_personal_data(&mut self, ctx: &egui::Context) {
        debug!("Save button clicked");
        let field = |i: usize| self.register_fields[i].trim().to_string();
        let age = field(1).parse::<i64>().unwrap_or(0);
        let profile = UserProfile {
            id: PROFILE_ID,
            name: field(0),
            age,
            gender: field(2),
            phone: field(3),
            email: field(4),
            city: field(5),
            state: field(6),
            country: field(7),
            ..Default::default()
        };

        let complete = !profile.name.is_empty()
            && profile.age > 0
            && !profile.gender.is_empty()
            && !profile.phone.is_empty()
            && !profile.email.is_empty()
            && !profile.city.is_empty()
            && !profile.state.is_empty()
            && !profile.country.is_empty();
        if !complete {
            self.show_toast("Preencha todos os campos corretamente");
            return;
        }
        if !is_valid_email(&profile.email) {
            self.show_toast("Email inválido");
            return;
        }

        match self.db.upsert_profile(&profile) {
            Ok(()) => {
                self.show_toast("Dados salvos com sucesso");
                // Personal data saved; next step is creating credentials
                self.navigate(Screen::PasswordSetup, ctx);
            }
            Err(e) => {
                error!(error = %e, "Failed to save profile");
                self.show_toast("Erro ao salvar dados");
            }
        }
    }
}
