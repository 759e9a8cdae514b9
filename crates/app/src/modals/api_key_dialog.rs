//! API key settings dialog.
//!
//! Shows the stored key masked, edits it in full, and hands the trimmed value
//! back to the caller, which persists it and re-runs the capability check.

use super::{overlay, Modal};
use egui::{Align2, Context, Id, Key, RichText, TextEdit, Vec2};

pub struct ApiKeyDialog {
    is_open: bool,
    key: String,
    current_masked: String,
    submission: Option<String>,
    id: Id,
}

/// Abbreviate a key for display: first and last four characters.
fn mask_key(key: &str) -> String {
    if key.is_empty() {
        "(not set)".to_string()
    } else if key.len() > 8 {
        format!("{}...{}", &key[..4], &key[key.len() - 4..])
    } else {
        key.to_string()
    }
}

impl ApiKeyDialog {
    pub fn new() -> Self {
        Self {
            is_open: false,
            key: String::new(),
            current_masked: String::new(),
            submission: None,
            id: Id::new("api_key_dialog"),
        }
    }

    pub fn open_with_key(&mut self, current: &str) {
        self.is_open = true;
        self.key = current.to_string();
        self.current_masked = mask_key(current);
        self.submission = None;
    }

    pub fn take_submission(&mut self) -> Option<String> {
        self.submission.take()
    }
}

impl Modal for ApiKeyDialog {
    fn update(&mut self, ctx: &Context) {
        if !self.is_open {
            return;
        }

        overlay(ctx, self.id.with("overlay"));

        let mut save = false;
        let mut cancel = false;

        egui::Window::new("API Settings")
            .id(self.id.with("window"))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.set_min_width(340.0);
                ui.add_space(4.0);

                ui.label(format!("Current key: {}", self.current_masked));
                ui.add_space(6.0);

                ui.label("DeepSeek API key:");
                let response = ui.add(
                    TextEdit::singleline(&mut self.key)
                        .desired_width(300.0)
                        .hint_text("sk-..."),
                );
                if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
                    save = true;
                }

                ui.add_space(4.0);
                ui.label(
                    RichText::new("Leave empty to disable the advanced bot.")
                        .small()
                        .weak(),
                );

                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui.button("Save").clicked() {
                        save = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });

        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            cancel = true;
        }

        if save {
            self.submission = Some(self.key.trim().to_string());
            self.is_open = false;
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
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masking_hides_the_middle() {
        assert_eq!(mask_key(""), "(not set)");
        assert_eq!(mask_key("short"), "short");
        assert_eq!(mask_key("sk-abcdefgh1234"), "sk-a...1234");
    }

    #[test]
    fn open_primes_the_field_with_the_current_key() {
        let mut d = ApiKeyDialog::new();
        d.open_with_key("sk-abcdefgh1234");
        assert!(d.is_open());
        assert_eq!(d.key, "sk-abcdefgh1234");
        assert_eq!(d.current_masked, "sk-a...1234");
    }
}
