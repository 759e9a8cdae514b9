//! Password recovery dialog.
//!
//! Two-step flow: look up the security question for a username, then reset
//! the password gated on the security answer. Both steps need the store, so
//! the dialog emits [`ForgotRequest`]s and the caller reports back via
//! `set_question` / `set_error`.

use super::{overlay, Modal};
use crate::modals::register_dialog::MIN_PASSWORD_LEN;
use egui::{Align2, Context, Id, Key, RichText, TextEdit, Vec2};
use zeroize::Zeroizing;

pub enum ForgotRequest {
    /// Fetch the security question for this username.
    Question(String),
    /// Attempt the reset; the store checks the answer.
    Reset {
        username: String,
        security_answer: String,
        new_password: String,
    },
}

pub struct ForgotDialog {
    is_open: bool,
    username: String,
    /// Some once a lookup succeeded; gates the reset button.
    question: Option<String>,
    question_hint: String,
    security_answer: String,
    new_password: Zeroizing<String>,
    confirm_password: Zeroizing<String>,
    error: Option<String>,
    request: Option<ForgotRequest>,
    id: Id,
}

impl ForgotDialog {
    pub fn new() -> Self {
        Self {
            is_open: false,
            username: String::new(),
            question: None,
            question_hint: "Enter a username and press Look up".to_string(),
            security_answer: String::new(),
            new_password: Zeroizing::new(String::new()),
            confirm_password: Zeroizing::new(String::new()),
            error: None,
            request: None,
            id: Id::new("forgot_dialog"),
        }
    }

    pub fn open(&mut self) {
        *self = Self::new();
        self.is_open = true;
    }

    pub fn take_request(&mut self) -> Option<ForgotRequest> {
        self.request.take()
    }

    /// Lookup result from the store.
    pub fn set_question(&mut self, question: Option<String>) {
        match question {
            Some(q) => {
                self.question_hint = q.clone();
                self.question = Some(q);
                self.error = None;
            }
            None => {
                self.question_hint = "No matching user found".to_string();
                self.question = None;
            }
        }
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    fn submit_reset(&mut self) {
        let username = self.username.trim().to_string();
        let answer = self.security_answer.trim().to_string();
        let new_password = self.new_password.trim().to_string();
        let confirm = self.confirm_password.trim().to_string();

        if username.is_empty() || answer.is_empty() || new_password.is_empty() {
            self.error = Some("All fields are required".to_string());
            return;
        }
        if new_password != confirm {
            self.error = Some("Passwords do not match".to_string());
            return;
        }
        if new_password.len() < MIN_PASSWORD_LEN {
            self.error = Some(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ));
            return;
        }

        self.error = None;
        self.request = Some(ForgotRequest::Reset {
            username,
            security_answer: answer,
            new_password,
        });
    }
}

impl Modal for ForgotDialog {
    fn update(&mut self, ctx: &Context) {
        if !self.is_open {
            return;
        }

        overlay(ctx, self.id.with("overlay"));

        let mut lookup = false;
        let mut reset = false;
        let mut cancel = false;

        egui::Window::new("Recover password")
            .id(self.id.with("window"))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.set_min_width(340.0);
                ui.add_space(4.0);

                if let Some(ref error) = self.error {
                    ui.colored_label(egui::Color32::RED, error);
                    ui.add_space(6.0);
                }

                egui::Grid::new(self.id.with("grid"))
                    .num_columns(2)
                    .spacing([8.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("Username:");
                        ui.horizontal(|ui| {
                            ui.add(TextEdit::singleline(&mut self.username).desired_width(130.0));
                            if ui.button("Look up").clicked() {
                                lookup = true;
                            }
                        });
                        ui.end_row();

                        ui.label("Security question:");
                        ui.label(RichText::new(&self.question_hint).italics());
                        ui.end_row();

                        ui.label("Answer:");
                        ui.add(TextEdit::singleline(&mut self.security_answer).desired_width(190.0));
                        ui.end_row();

                        ui.label("New password:");
                        ui.add(
                            TextEdit::singleline(&mut *self.new_password)
                                .password(true)
                                .desired_width(190.0),
                        );
                        ui.end_row();

                        ui.label("Confirm new password:");
                        ui.add(
                            TextEdit::singleline(&mut *self.confirm_password)
                                .password(true)
                                .desired_width(190.0),
                        );
                        ui.end_row();
                    });

                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(self.question.is_some(), egui::Button::new("Reset password"))
                        .clicked()
                    {
                        reset = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });

        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            cancel = true;
        }

        if lookup {
            let username = self.username.trim().to_string();
            if username.is_empty() {
                self.error = Some("Enter a username first".to_string());
            } else {
                self.error = None;
                self.request = Some(ForgotRequest::Question(username));
            }
        }
        if reset {
            self.submit_reset();
        }
        if cancel {
            self.close();
        }
    }

    fn is_open(&self) -> bool {
        self.is_open
    }

    fn close(&mut self) {
        self.is_open = false;
        self.new_password = Zeroizing::new(String::new());
        self.confirm_password = Zeroizing::new(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_requires_all_fields() {
        let mut d = ForgotDialog::new();
        d.username = "ada".to_string();
        d.submit_reset();
        assert!(d.take_request().is_none());
        assert!(d.error.is_some());
    }

    #[test]
    fn reset_enforces_confirmation_and_length() {
        let mut d = ForgotDialog::new();
        d.username = "ada".to_string();
        d.security_answer = "analytical".to_string();
        d.new_password = Zeroizing::new("abcdef".to_string());
        d.confirm_password = Zeroizing::new("other".to_string());
        d.submit_reset();
        assert!(d.take_request().is_none());

        d.confirm_password = Zeroizing::new("abcdef".to_string());
        d.submit_reset();
        assert!(matches!(d.take_request(), Some(ForgotRequest::Reset { .. })));
    }

    #[test]
    fn failed_lookup_keeps_reset_gated() {
        let mut d = ForgotDialog::new();
        d.set_question(None);
        assert!(d.question.is_none());
        d.set_question(Some("favorite engine?".to_string()));
        assert_eq!(d.question.as_deref(), Some("favorite engine?"));
    }
}
