//! Login screen: the unauthenticated state of the app.
//!
//! Registration and password recovery live in modal dialogs layered on top;
//! this screen only collects credentials and reports generic failures.

use crate::state::AppState;
use egui::{Key, RichText, TextEdit};
use zeroize::Zeroizing;

#[derive(Default)]
pub struct LoginForm {
    pub username: String,
    pub password: Zeroizing<String>,
    pub error: Option<String>,
    /// Non-error notices, e.g. after a password reset.
    pub info: Option<String>,
}

pub fn render_login_screen(s: &mut AppState, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(60.0);
            ui.heading(RichText::new("Confab").size(34.0));
            ui.label(RichText::new("Sign in to start chatting").weak());
            ui.add_space(24.0);

            if let Some(ref info) = s.login.info {
                ui.colored_label(egui::Color32::from_rgb(80, 160, 80), info);
                ui.add_space(6.0);
            }
            if let Some(ref error) = s.login.error {
                ui.colored_label(egui::Color32::RED, error);
                ui.add_space(6.0);
            }

            let mut submit = false;

            egui::Grid::new("login_form")
                .num_columns(2)
                .spacing([8.0, 10.0])
                .show(ui, |ui| {
                    ui.label("Username:");
                    ui.add(TextEdit::singleline(&mut s.login.username).desired_width(200.0));
                    ui.end_row();

                    ui.label("Password:");
                    let response = ui.add(
                        TextEdit::singleline(&mut *s.login.password)
                            .password(true)
                            .desired_width(200.0),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
                        submit = true;
                    }
                    ui.end_row();
                });

            ui.add_space(16.0);
            ui.horizontal(|ui| {
                // Center the button row under the form.
                let total = 260.0;
                ui.add_space((ui.available_width() - total).max(0.0) / 2.0);
                if ui
                    .add_sized([80.0, 30.0], egui::Button::new("Log in"))
                    .clicked()
                {
                    submit = true;
                }
                if ui.button("Register").clicked() {
                    s.register.open();
                }
                if ui.button("Forgot password").clicked() {
                    s.forgot.open();
                }
            });

            if submit {
                s.login.info = None;
                s.attempt_login();
            }

            ui.add_space(30.0);
            if ui
                .add(egui::Button::new(RichText::new("Quit").weak()).frame(false))
                .clicked()
            {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });
    });
}
