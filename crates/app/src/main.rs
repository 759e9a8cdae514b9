use eframe::egui;
use parking_lot::Mutex;
use std::sync::Arc;

mod auth;
mod gpu;
mod modals;
mod selector;
mod session;
mod state;
mod tabs;

use auth::render_login_screen;
use modals::Modal;
use providers::ResponderKind;
use selector::SelectorAction;
use shared::chat::{ChatEntry, Sender};
use state::{save_settings, AppState, Screen};

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let state = match AppState::new() {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("failed to start Confab: {e:#}");
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 600.0])
            .with_min_inner_size([700.0, 480.0]),
        vsync: true,
        ..Default::default()
    };
    eframe::run_native(
        "Confab",
        options,
        Box::new(|_cc| {
            Box::new(ConfabApp {
                state: Arc::new(Mutex::new(state)),
                window_title: "Confab".to_string(),
            })
        }),
    )
}

struct ConfabApp {
    state: Arc<Mutex<AppState>>,
    window_title: String,
}

impl eframe::App for ConfabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut s = self.state.lock();

        // Pick up finished responder calls (non-blocking).
        s.poll_tabs();
        if s.tabs.any_thinking() {
            ctx.request_repaint();
        }

        let title = match &s.session {
            Some(session) if s.screen == Screen::Chat => {
                format!("Confab - {}", session.username())
            }
            _ => "Confab".to_string(),
        };
        if title != self.window_title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.window_title = title;
        }

        apply_theme(ctx, s.settings.dark_mode);

        match s.screen {
            Screen::Login => render_login_screen(&mut s, ctx),
            Screen::Chat => render_chat_screen(&mut s, ctx),
        }

        // Dialogs float above whichever screen is showing.
        s.register.update(ctx);
        s.forgot.update(ctx);
        s.api_key_dialog.update(ctx);
        s.process_dialogs();
    }
}

fn apply_theme(ctx: &egui::Context, dark: bool) {
    let mut style = (*ctx.style()).clone();
    style.visuals = if dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };
    style.visuals.window_rounding = egui::Rounding::same(10.0);
    style.spacing.item_spacing = egui::vec2(8.0, 8.0);
    style.visuals.panel_fill = if dark {
        egui::Color32::from_rgb(30, 30, 35)
    } else {
        egui::Color32::from_rgb(250, 250, 252)
    };
    ctx.set_style(style);
}

fn render_chat_screen(s: &mut AppState, ctx: &egui::Context) {
    let dark = s.settings.dark_mode;

    // Left sidebar: bot selector, collapsible.
    let panel = if s.selector.collapsed {
        egui::SidePanel::left("bot_selector")
            .exact_width(40.0)
            .resizable(false)
    } else {
        egui::SidePanel::left("bot_selector")
            .default_width(s.settings.sidebar_width)
            .width_range(160.0..=320.0)
            .resizable(true)
    };
    let sidebar = panel.show(ctx, |ui| s.selector.show(ui));
    if !s.selector.collapsed {
        s.settings.sidebar_width = sidebar.response.rect.width();
    }
    for action in sidebar.inner {
        match action {
            SelectorAction::ModeChosen(mode) => s.choose_mode(mode),
            SelectorAction::OpenApiSettings => {
                let key = s
                    .session
                    .as_ref()
                    .map(|session| session.api_key().to_string())
                    .unwrap_or_default();
                s.api_key_dialog.open_with_key(&key);
            }
            SelectorAction::ToggleCollapsed => {
                s.selector.collapsed = !s.selector.collapsed;
                save_settings(&s.settings);
            }
        }
    }

    // Bottom bar: new chat, user info, theme toggle, logout.
    egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let new_chat = egui::Button::new(egui::RichText::new("＋ New chat").color(egui::Color32::WHITE))
                .fill(egui::Color32::from_rgb(70, 130, 180))
                .rounding(egui::Rounding::same(6.0));
            if ui.add(new_chat).clicked() {
                s.open_tab();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let logout = egui::Button::new(egui::RichText::new("Log out").color(egui::Color32::WHITE))
                    .fill(egui::Color32::from_rgb(96, 125, 139))
                    .rounding(egui::Rounding::same(6.0));
                if ui.add(logout).clicked() {
                    s.show_logout_confirm = true;
                }
                if ui
                    .button(if dark { "☀" } else { "🌙" })
                    .on_hover_text("Toggle dark mode")
                    .clicked()
                {
                    s.settings.dark_mode = !s.settings.dark_mode;
                    save_settings(&s.settings);
                }
                if let Some(session) = &s.session {
                    ui.label(format!("User: {}", session.username()));
                }
            });
        });
        ui.add_space(6.0);
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        render_banner(s, ui);
        render_tab_bar(s, ui);
        ui.separator();

        let input_height = 70.0;
        let chat_height = (ui.available_height() - input_height).max(120.0);
        render_chat_log(s, ui, chat_height, dark);

        ui.add_space(6.0);
        render_input_row(s, ui);
    });

    render_logout_confirm(s, ctx);
    render_api_setup_prompt(s, ctx);
}

fn render_banner(s: &mut AppState, ui: &mut egui::Ui) {
    let Some(text) = s.banner.clone() else {
        return;
    };
    egui::Frame::none()
        .fill(egui::Color32::from_rgb(250, 235, 200).gamma_multiply(if s.settings.dark_mode { 0.25 } else { 1.0 }))
        .rounding(egui::Rounding::same(6.0))
        .inner_margin(egui::Margin::same(8.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(text).color(egui::Color32::from_rgb(160, 110, 40)));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("✕").clicked() {
                        s.banner = None;
                    }
                });
            });
        });
    ui.add_space(6.0);
}

fn render_tab_bar(s: &mut AppState, ui: &mut egui::Ui) {
    let active = s.tabs.active_index();
    let labels: Vec<(String, &'static str)> = s
        .tabs
        .tabs()
        .iter()
        .map(|tab| {
            let icon = if tab.responder_kind() == ResponderKind::Advanced {
                "⚡"
            } else {
                "💬"
            };
            let thinking = if tab.is_thinking() { " …" } else { "" };
            (
                format!("{icon} {}{thinking}", tab.title),
                tab.responder_kind().display_name(),
            )
        })
        .collect();

    let mut select: Option<usize> = None;
    let mut close: Option<usize> = None;

    ui.horizontal_wrapped(|ui| {
        for (i, (label, kind)) in labels.iter().enumerate() {
            if ui
                .selectable_label(i == active, label)
                .on_hover_text(format!("{kind} bot"))
                .clicked()
            {
                select = Some(i);
            }
            if ui
                .small_button(egui::RichText::new("✕").size(10.0))
                .on_hover_text("Close chat")
                .clicked()
            {
                close = Some(i);
            }
            ui.add_space(4.0);
        }
    });

    if let Some(i) = select {
        s.tabs.set_active(i);
    }
    if let Some(i) = close {
        s.close_tab(i);
    }
}

fn render_chat_log(s: &mut AppState, ui: &mut egui::Ui, chat_height: f32, dark: bool) {
    let entries: Vec<ChatEntry> = s
        .tabs
        .active_tab()
        .map(|tab| tab.entries.clone())
        .unwrap_or_default();
    let is_thinking = s.tabs.active_tab().map(|t| t.is_thinking()).unwrap_or(false);

    egui::ScrollArea::vertical()
        .max_height(chat_height)
        .min_scrolled_height(chat_height)
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for entry in &entries {
                ui.add_space(4.0);
                render_entry(ui, entry, dark);
                ui.add_space(4.0);
            }

            // Transient placeholder; replaced by the real entry when the
            // reply lands, never written into the log.
            if is_thinking {
                ui.add_space(4.0);
                egui::Frame::none()
                    .fill(if dark {
                        egui::Color32::from_rgb(50, 50, 58)
                    } else {
                        egui::Color32::from_rgb(230, 230, 235)
                    })
                    .rounding(egui::Rounding::same(10.0))
                    .inner_margin(egui::Margin::same(10.0))
                    .show(ui, |ui| {
                        let time = ui.input(|i| i.time);
                        let dots = match ((time * 2.0) as i32) % 4 {
                            0 => "   ",
                            1 => ".  ",
                            2 => ".. ",
                            _ => "...",
                        };
                        ui.label(
                            egui::RichText::new(format!("Thinking{dots}"))
                                .italics()
                                .weak(),
                        );
                    });
                ui.ctx().request_repaint();
            }
        });
}

fn render_entry(ui: &mut egui::Ui, entry: &ChatEntry, dark: bool) {
    match entry.sender {
        Sender::User => {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                egui::Frame::none()
                    .fill(if dark {
                        egui::Color32::from_rgb(45, 75, 105)
                    } else {
                        egui::Color32::from_rgb(205, 228, 250)
                    })
                    .rounding(egui::Rounding::same(10.0))
                    .inner_margin(egui::Margin::same(10.0))
                    .show(ui, |ui| {
                        ui.set_max_width(ui.available_width() * 0.75);
                        ui.label(&entry.text);
                    });
            });
        }
        Sender::Bot => {
            ui.with_layout(egui::Layout::left_to_right(egui::Align::Min), |ui| {
                egui::Frame::none()
                    .fill(if dark {
                        egui::Color32::from_rgb(50, 50, 58)
                    } else {
                        egui::Color32::from_rgb(235, 235, 240)
                    })
                    .rounding(egui::Rounding::same(10.0))
                    .inner_margin(egui::Margin::same(10.0))
                    .show(ui, |ui| {
                        ui.set_max_width(ui.available_width() * 0.75);
                        ui.vertical(|ui| {
                            ui.label(egui::RichText::new("Bot").small().strong());
                            ui.label(&entry.text);
                        });
                    });
            });
        }
        Sender::System => {
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new(&entry.text).italics().weak());
            });
        }
        Sender::Error => {
            egui::Frame::none()
                .fill(if dark {
                    egui::Color32::from_rgb(70, 40, 40)
                } else {
                    egui::Color32::from_rgb(250, 225, 225)
                })
                .rounding(egui::Rounding::same(10.0))
                .inner_margin(egui::Margin::same(10.0))
                .show(ui, |ui| {
                    ui.label(
                        egui::RichText::new(format!("Error: {}", entry.text))
                            .color(egui::Color32::from_rgb(200, 80, 80)),
                    );
                });
        }
    }
}

fn render_input_row(s: &mut AppState, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        let response = ui.add_sized(
            [ui.available_width() - 80.0, 52.0],
            egui::TextEdit::multiline(&mut s.input_text)
                .desired_rows(2)
                .hint_text("Type a message... (Enter to send, Ctrl+Enter for a new line)"),
        );

        // Enter sends; Ctrl+Enter keeps typing. egui has already inserted
        // Enter's newline by the time the key is visible here, so strip it
        // before handing the text off.
        if response.has_focus() {
            let (enter, ctrl) =
                ui.input(|i| (i.key_pressed(egui::Key::Enter), i.modifiers.ctrl));
            if enter && !ctrl {
                if s.input_text.ends_with('\n') {
                    s.input_text.pop();
                }
                s.send_current();
                response.request_focus();
            } else if enter && ctrl {
                s.input_text.push('\n');
            }
        }

        let send = egui::Button::new(egui::RichText::new("Send").color(egui::Color32::WHITE))
            .fill(egui::Color32::from_rgb(76, 175, 80))
            .rounding(egui::Rounding::same(6.0));
        if ui.add_sized([70.0, 52.0], send).clicked() {
            s.send_current();
        }
    });
}

fn render_logout_confirm(s: &mut AppState, ctx: &egui::Context) {
    if !s.show_logout_confirm {
        return;
    }
    egui::Window::new("Confirm logout")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label("Log out of this account?");
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Log out").clicked() {
                    s.logout();
                }
                if ui.button("Cancel").clicked() {
                    s.show_logout_confirm = false;
                }
            });
        });
}

fn render_api_setup_prompt(s: &mut AppState, ctx: &egui::Context) {
    if !s.prompt_api_setup {
        return;
    }
    egui::Window::new("Set up API key")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label(
                "You haven't set a DeepSeek API key yet. Without one, the \
                 advanced bot stays disabled. Set it up now?",
            );
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Set up now").clicked() {
                    s.prompt_api_setup = false;
                    s.api_key_dialog.open_with_key("");
                }
                if ui.button("Later").clicked() {
                    s.prompt_api_setup = false;
                }
            });
        });
}
