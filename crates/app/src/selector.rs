//! Sidebar bot selector: two mode cards, an eligibility status line, and the
//! API settings entry point. Collapsible, remembering its expanded width.

use egui::{Color32, RichText, Ui};
use shared::chat::BotMode;

pub enum SelectorAction {
    ModeChosen(BotMode),
    OpenApiSettings,
    ToggleCollapsed,
}

pub struct BotSelector {
    /// The user's last explicit choice. May be Advanced even while
    /// ineligible; the session records the request and resolves it.
    pub selected: BotMode,
    pub advanced_available: bool,
    pub collapsed: bool,
}

impl BotSelector {
    pub fn new(advanced_available: bool) -> Self {
        Self {
            selected: if advanced_available { BotMode::Advanced } else { BotMode::Simple },
            advanced_available,
            collapsed: false,
        }
    }

    /// Reflect the session after a transition (e.g. a forced fallback to
    /// Simple when the key was cleared).
    pub fn sync(&mut self, selected: BotMode, advanced_available: bool) {
        self.selected = selected;
        self.advanced_available = advanced_available;
    }

    pub fn show(&mut self, ui: &mut Ui) -> Vec<SelectorAction> {
        let mut actions = Vec::new();

        if self.collapsed {
            ui.add_space(8.0);
            if ui.button("»").on_hover_text("Expand panel").clicked() {
                actions.push(SelectorAction::ToggleCollapsed);
            }
            return actions;
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label(RichText::new("Choose a bot").strong().size(15.0));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("«").on_hover_text("Collapse panel").clicked() {
                    actions.push(SelectorAction::ToggleCollapsed);
                }
            });
        });
        ui.add_space(8.0);

        if self.mode_card(
            ui,
            BotMode::Simple,
            "Simple bot",
            "Runs locally\nNo API key needed\nBasic conversation",
        ) {
            actions.push(SelectorAction::ModeChosen(BotMode::Simple));
        }
        ui.add_space(6.0);
        if self.mode_card(
            ui,
            BotMode::Advanced,
            "Advanced AI",
            "DeepSeek AI\nRequires API key\nGPU accelerated\nRicher answers",
        ) {
            actions.push(SelectorAction::ModeChosen(BotMode::Advanced));
        }

        ui.add_space(10.0);
        if self.advanced_available {
            ui.colored_label(Color32::from_rgb(80, 160, 80), "Advanced mode available ✓");
        } else {
            ui.colored_label(Color32::from_rgb(200, 140, 60), "Simple mode only ⚠");
        }

        ui.add_space(10.0);
        if ui.button("API Settings").clicked() {
            actions.push(SelectorAction::OpenApiSettings);
        }

        actions
    }

    fn mode_card(&mut self, ui: &mut Ui, mode: BotMode, title: &str, blurb: &str) -> bool {
        let selected = self.selected == mode;
        let mut clicked = false;
        let fill = if selected {
            ui.visuals().selection.bg_fill.gamma_multiply(0.3)
        } else {
            ui.visuals().faint_bg_color
        };
        egui::Frame::none()
            .fill(fill)
            .rounding(egui::Rounding::same(8.0))
            .inner_margin(egui::Margin::same(8.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                let response = ui
                    .vertical(|ui| {
                        ui.label(RichText::new(title).strong());
                        ui.label(RichText::new(blurb).small().weak());
                    })
                    .response;
                if response.interact(egui::Sense::click()).clicked() && !selected {
                    clicked = true;
                }
            });
        clicked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_the_best_available_mode() {
        assert_eq!(BotSelector::new(true).selected, BotMode::Advanced);
        assert_eq!(BotSelector::new(false).selected, BotMode::Simple);
    }

    #[test]
    fn sync_reflects_forced_fallback() {
        let mut selector = BotSelector::new(true);
        selector.sync(BotMode::Simple, false);
        assert_eq!(selector.selected, BotMode::Simple);
        assert!(!selector.advanced_available);
    }
}
