//! Modal dialogs layered over the login and chat screens.

pub mod api_key_dialog;
pub mod forgot_dialog;
pub mod register_dialog;

pub use api_key_dialog::ApiKeyDialog;
pub use forgot_dialog::{ForgotDialog, ForgotRequest};
pub use register_dialog::{RegisterDialog, Registration};

use egui::Context;

/// A dialog that renders itself each frame while open. Submissions are pulled
/// by the caller (`take_*` methods on each dialog), which decides whether the
/// dialog closes; database-backed checks happen outside the dialog.
pub trait Modal {
    fn update(&mut self, ctx: &Context);

    fn is_open(&self) -> bool;

    fn close(&mut self);
}

/// Dim the screen behind an open modal.
pub(crate) fn overlay(ctx: &Context, id: egui::Id) {
    egui::Area::new(id)
        .anchor(egui::Align2::LEFT_TOP, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            let screen_rect = ctx.screen_rect();
            ui.allocate_response(screen_rect.size(), egui::Sense::click());
            ui.painter()
                .rect_filled(screen_rect, 0.0, egui::Color32::from_black_alpha(160));
        });
}
