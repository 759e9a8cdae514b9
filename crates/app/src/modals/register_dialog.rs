//! Account registration dialog.
//!
//! Local validation (required fields, password confirmation, minimum length)
//! happens here; the username-taken check needs the store and is done by the
//! caller, which reports back through `set_error`.

use super::{overlay, Modal};
use egui::{Align2, Context, Id, Key, TextEdit, Vec2};
use zeroize::Zeroizing;

/// Minimum password length, shared with the reset flow.
pub const MIN_PASSWORD_LEN: usize = 6;

/// A validated submission, ready for the store.
#[derive(Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub security_question: String,
    pub security_answer: String,
}

pub struct RegisterDialog {
    is_open: bool,
    username: String,
    password: Zeroizing<String>,
    confirm_password: Zeroizing<String>,
    security_question: String,
    security_answer: String,
    error: Option<String>,
    submission: Option<Registration>,
    id: Id,
}

impl RegisterDialog {
    pub fn new() -> Self {
        Self {
            is_open: false,
            username: String::new(),
            password: Zeroizing::new(String::new()),
            confirm_password: Zeroizing::new(String::new()),
            security_question: String::new(),
            security_answer: String::new(),
            error: None,
            submission: None,
            id: Id::new("register_dialog"),
        }
    }

    pub fn open(&mut self) {
        *self = Self::new();
        self.is_open = true;
    }

    /// Store-level failure (username taken, write error); keeps the dialog open.
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub fn take_submission(&mut self) -> Option<Registration> {
        self.submission.take()
    }

    fn submit(&mut self) {
        let username = self.username.trim().to_string();
        let password = self.password.trim().to_string();
        let confirm = self.confirm_password.trim().to_string();
        let question = self.security_question.trim().to_string();
        let answer = self.security_answer.trim().to_string();

        if username.is_empty() || password.is_empty() || question.is_empty() || answer.is_empty() {
            self.error = Some("All fields are required".to_string());
            return;
        }
        if password != confirm {
            self.error = Some("Passwords do not match".to_string());
            return;
        }
        if password.len() < MIN_PASSWORD_LEN {
            self.error = Some(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ));
            return;
        }

        self.error = None;
        self.submission = Some(Registration {
            username,
            password,
            security_question: question,
            security_answer: answer,
        });
    }
}

impl Modal for RegisterDialog {
    fn update(&mut self, ctx: &Context) {
        if !self.is_open {
            return;
        }

        overlay(ctx, self.id.with("overlay"));

        let mut submit = false;
        let mut cancel = false;

        egui::Window::new("Create account")
            .id(self.id.with("window"))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.set_min_width(320.0);
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
                        ui.add(TextEdit::singleline(&mut self.username).desired_width(190.0));
                        ui.end_row();

                        ui.label("Password:");
                        ui.add(
                            TextEdit::singleline(&mut *self.password)
                                .password(true)
                                .desired_width(190.0),
                        );
                        ui.end_row();

                        ui.label("Confirm password:");
                        ui.add(
                            TextEdit::singleline(&mut *self.confirm_password)
                                .password(true)
                                .desired_width(190.0),
                        );
                        ui.end_row();

                        ui.label("Security question:");
                        ui.add(
                            TextEdit::singleline(&mut self.security_question).desired_width(190.0),
                        );
                        ui.end_row();

                        ui.label("Answer:");
                        ui.add(
                            TextEdit::singleline(&mut self.security_answer).desired_width(190.0),
                        );
                        ui.end_row();
                    });

                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui.button("Register").clicked() {
                        submit = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });

        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            cancel = true;
        }

        if submit {
            self.submit();
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
        self.password = Zeroizing::new(String::new());
        self.confirm_password = Zeroizing::new(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> RegisterDialog {
        let mut d = RegisterDialog::new();
        d.username = "ada".to_string();
        d.password = Zeroizing::new("hunter2".to_string());
        d.confirm_password = Zeroizing::new("hunter2".to_string());
        d.security_question = "favorite engine?".to_string();
        d.security_answer = "analytical".to_string();
        d
    }

    #[test]
    fn valid_input_produces_a_submission() {
        let mut d = filled();
        d.submit();
        let reg = d.take_submission().expect("submission");
        assert_eq!(reg.username, "ada");
        assert!(d.error.is_none());
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut d = filled();
        d.username.clear();
        d.submit();
        assert!(d.take_submission().is_none());
        assert!(d.error.is_some());
    }

    #[test]
    fn password_mismatch_is_rejected() {
        let mut d = filled();
        d.confirm_password = Zeroizing::new("different".to_string());
        d.submit();
        assert!(d.take_submission().is_none());
    }

    #[test]
    fn short_password_is_rejected() {
        let mut d = filled();
        d.password = Zeroizing::new("abc".to_string());
        d.confirm_password = Zeroizing::new("abc".to_string());
        d.submit();
        assert!(d.take_submission().is_none());
    }

    #[test]
    fn close_clears_password_fields() {
        let mut d = filled();
        d.close();
        assert!(d.password.is_empty());
        assert!(d.confirm_password.is_empty());
    }
}
