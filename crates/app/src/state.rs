//! Application state and the wiring between store, session, tabs, and dialogs.

use crate::auth::LoginForm;
use crate::gpu;
use crate::modals::{ApiKeyDialog, ForgotDialog, ForgotRequest, Modal, RegisterDialog, Registration};
use crate::selector::BotSelector;
use crate::session::{
    RebindScope, Session, SessionEvent, API_KEY_REBIND_SCOPE, MODE_SWITCH_REBIND_SCOPE,
};
use crate::tabs::{CloseOutcome, SendJob, SendOutcome, TabStrip};
use anyhow::Context as _;
use providers::{bind, BindWarning};
use shared::chat::ChatEntry;
use shared::settings::AppSettings;
use std::fs;
use std::path::PathBuf;
use store::UserStore;

/// Which top-level screen is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Login,
    Chat,
}

pub struct AppState {
    pub store: UserStore,
    pub settings: AppSettings,
    pub screen: Screen,
    pub login: LoginForm,
    pub register: RegisterDialog,
    pub forgot: ForgotDialog,
    pub api_key_dialog: ApiKeyDialog,
    pub session: Option<Session>,
    pub tabs: TabStrip,
    pub selector: BotSelector,
    /// One-line notice shown above the chat log until dismissed.
    pub banner: Option<String>,
    pub input_text: String,
    pub show_logout_confirm: bool,
    /// Offer the API settings dialog once after a login with no key.
    pub prompt_api_setup: bool,
}

impl AppState {
    pub fn new() -> anyhow::Result<Self> {
        let dirs = directories::ProjectDirs::from("com.local", "Confab", "Confab")
            .context("could not determine a home directory")?;
        let store = UserStore::open(dirs.data_dir())?;
        Ok(Self::with_store(store, load_settings_or_default()))
    }

    pub fn with_store(store: UserStore, settings: AppSettings) -> Self {
        Self {
            store,
            settings,
            screen: Screen::Login,
            login: LoginForm::default(),
            register: RegisterDialog::new(),
            forgot: ForgotDialog::new(),
            api_key_dialog: ApiKeyDialog::new(),
            session: None,
            tabs: TabStrip::new(),
            selector: BotSelector::new(false),
            banner: None,
            input_text: String::new(),
            show_logout_confirm: false,
            prompt_api_setup: false,
        }
    }

    // ── Login / logout ──

    pub fn attempt_login(&mut self) {
        let username = self.login.username.trim().to_string();
        let password = self.login.password.trim().to_string();

        if username.is_empty() || password.is_empty() {
            self.login.error = Some("Username and password are required".to_string());
            return;
        }

        match self.store.verify(&username, &password) {
            Ok(Some(record)) => {
                self.start_session(record.username, &record.api_key, gpu::has_gpu_acceleration());
            }
            Ok(None) => {
                self.login.error = Some("Username or password incorrect".to_string());
            }
            Err(e) => {
                tracing::warn!(error = %e, "login lookup failed");
                self.login.error = Some("Something went wrong - please try again".to_string());
            }
        }
    }

    /// Enter the chat screen with a fresh session. GPU availability is a
    /// parameter so the lifecycle stays testable off the real probe.
    pub fn start_session(&mut self, username: String, api_key: &str, gpu_available: bool) {
        let session = Session::new(username, api_key, gpu_available);
        tracing::info!(
            user = session.username(),
            eligible = session.eligible(),
            "logged in"
        );

        self.selector = BotSelector::new(session.eligible());
        self.selector.sync(session.requested_mode(), session.eligible());
        self.tabs = TabStrip::new();
        self.prompt_api_setup = session.api_key().is_empty();
        self.session = Some(session);
        self.open_tab();

        self.login = LoginForm::default();
        self.input_text.clear();
        self.banner = None;
        self.screen = Screen::Chat;
    }

    /// Tear the session down and return to the login screen, in-process.
    pub fn logout(&mut self) {
        if let Some(session) = &self.session {
            tracing::info!(user = session.username(), "logged out");
        }
        self.session = None;
        self.tabs = TabStrip::new();
        self.selector = BotSelector::new(false);
        self.banner = None;
        self.input_text.clear();
        self.show_logout_confirm = false;
        self.prompt_api_setup = false;
        self.login = LoginForm::default();
        self.screen = Screen::Login;
        save_settings(&self.settings);
    }

    // ── Tabs ──

    /// Open a tab bound per the session's current (requested, eligible) pair.
    pub fn open_tab(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let (responder, warning) = bind(
            session.requested_mode(),
            session.eligible(),
            session.api_key(),
            &self.settings.advanced,
        );
        self.tabs.open(responder);
        if let Some(w) = warning {
            self.banner = Some(w.message);
        }
    }

    pub fn close_tab(&mut self, index: usize) {
        if let CloseOutcome::LastTab = self.tabs.close(index) {
            self.banner = Some("At least one chat must stay open".to_string());
        }
    }

    // ── Mode & key transitions ──

    pub fn choose_mode(&mut self, mode: shared::chat::BotMode) {
        let Some(session) = &mut self.session else {
            return;
        };
        let events = session.request_mode(mode);
        let api_key = session.api_key().to_string();
        let use_advanced = session.use_advanced();
        let effective = session.effective_mode();
        self.selector.sync(session.requested_mode(), session.eligible());

        for event in events {
            if event == SessionEvent::AdvancedUnavailable {
                self.banner = Some(
                    "Advanced mode needs an API key and GPU support. \
                     Configure your key in API Settings."
                        .to_string(),
                );
            }
        }

        let warning = self.rebind_tabs(MODE_SWITCH_REBIND_SCOPE, &api_key, use_advanced);
        if let Some(tab) = self.tabs.active_tab_mut() {
            tab.entries.push(ChatEntry::system(format!(
                "Switched to {} mode",
                effective.display_name()
            )));
        }
        if let Some(w) = warning {
            self.banner = Some(w.message);
        }
    }

    pub fn apply_api_key(&mut self, key: &str) {
        let Some(session) = &mut self.session else {
            return;
        };

        if let Err(e) = self.store.update_api_key(session.username(), key.trim()) {
            tracing::warn!(error = %e, "failed to persist API key");
            self.banner = Some("Could not save the API key - please try again".to_string());
            return;
        }

        let events = session.update_api_key(key);
        let api_key = session.api_key().to_string();
        let use_advanced = session.use_advanced();
        self.selector.sync(session.requested_mode(), session.eligible());

        let mut banner = Some("API settings updated".to_string());
        for event in events {
            if event == SessionEvent::ModeForcedSimple {
                banner = Some(
                    "Advanced mode is no longer available - switched to the simple bot"
                        .to_string(),
                );
            }
        }

        if let Some(w) = self.rebind_tabs(API_KEY_REBIND_SCOPE, &api_key, use_advanced) {
            banner = Some(w.message);
        }
        self.banner = banner;
    }

    /// Re-resolve tab bindings per the given propagation policy.
    fn rebind_tabs(
        &mut self,
        scope: RebindScope,
        api_key: &str,
        use_advanced: bool,
    ) -> Option<BindWarning> {
        let mut warning = None;
        match scope {
            RebindScope::ActiveTabOnly => {
                if let Some(tab) = self.tabs.active_tab_mut() {
                    warning = tab.update_binding(api_key, use_advanced, &self.settings.advanced);
                }
            }
            RebindScope::AllTabs => {
                for tab in self.tabs.tabs_mut() {
                    if let Some(w) =
                        tab.update_binding(api_key, use_advanced, &self.settings.advanced)
                    {
                        warning = Some(w);
                    }
                }
            }
        }
        warning
    }

    // ── Sending ──

    pub fn send_current(&mut self) {
        let text = std::mem::take(&mut self.input_text);
        let Some(tab) = self.tabs.active_tab_mut() else {
            return;
        };
        match tab.send(&text) {
            SendOutcome::Started(job) => spawn_responder_worker(job),
            SendOutcome::RejectedEmpty => {
                self.input_text = text;
            }
            SendOutcome::RejectedBusy => {
                self.input_text = text;
                self.banner = Some("Hold on - the bot is still thinking".to_string());
            }
        }
    }

    pub fn poll_tabs(&mut self) -> bool {
        self.tabs.poll_all()
    }

    // ── Dialog plumbing ──

    pub fn process_dialogs(&mut self) {
        if let Some(registration) = self.register.take_submission() {
            if let Err(message) = self.handle_registration(registration) {
                self.register.set_error(message);
            } else {
                self.register.close();
            }
        }

        if let Some(request) = self.forgot.take_request() {
            self.handle_forgot_request(request);
        }

        if let Some(key) = self.api_key_dialog.take_submission() {
            self.apply_api_key(&key);
        }
    }

    /// Store-backed half of registration. A fresh account logs straight in
    /// with an empty API key.
    fn handle_registration(&mut self, registration: Registration) -> Result<(), String> {
        match self.store.exists(&registration.username) {
            Ok(true) => return Err("Username already taken".to_string()),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, "registration lookup failed");
                return Err("Could not create the account - please try again".to_string());
            }
        }
        match self.store.add(
            &registration.username,
            &registration.password,
            &registration.security_question,
            &registration.security_answer,
        ) {
            Ok(true) => {
                self.start_session(registration.username, "", gpu::has_gpu_acceleration());
                Ok(())
            }
            Ok(false) => Err("Username already taken".to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "registration failed");
                Err("Could not create the account - please try again".to_string())
            }
        }
    }

    fn handle_forgot_request(&mut self, request: ForgotRequest) {
        match request {
            ForgotRequest::Question(username) => match self.store.security_question(&username) {
                Ok(question) => self.forgot.set_question(question),
                Err(e) => {
                    tracing::warn!(error = %e, "security question lookup failed");
                    self.forgot.set_error("Something went wrong - please try again");
                }
            },
            ForgotRequest::Reset {
                username,
                security_answer,
                new_password,
            } => match self
                .store
                .reset_password(&username, &security_answer, &new_password)
            {
                Ok(true) => {
                    self.forgot.close();
                    self.login.info =
                        Some("Password reset - log in with your new password".to_string());
                }
                Ok(false) => {
                    self.forgot
                        .set_error("Security answer incorrect or user not found");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "password reset failed");
                    self.forgot.set_error("Something went wrong - please try again");
                }
            },
        }
    }
}

/// Run a responder call off the UI thread; the reply lands in the tab's
/// channel and is picked up by the per-frame poll.
pub fn spawn_responder_worker(job: SendJob) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = job
                    .reply_tx
                    .send(Err(format!("Failed to start async runtime: {e}")));
                return;
            }
        };
        let result = rt
            .block_on(job.responder.respond(&job.history))
            .map_err(|e| e.to_string());
        let _ = job.reply_tx.send(result);
    });
}

// ── Settings persistence ──

fn config_path() -> Option<PathBuf> {
    if let Some(proj) = directories::ProjectDirs::from("com.local", "Confab", "Confab") {
        let _ = fs::create_dir_all(proj.config_dir());
        Some(proj.config_dir().join("settings.json"))
    } else {
        None
    }
}

pub fn load_settings_or_default() -> AppSettings {
    if let Some(path) = config_path() {
        if path.exists() {
            if let Ok(bytes) = fs::read(&path) {
                if let Ok(settings) = serde_json::from_slice::<AppSettings>(&bytes) {
                    return settings;
                }
            }
        }
    }
    AppSettings::default()
}

pub fn save_settings(settings: &AppSettings) {
    if let Some(path) = config_path() {
        if let Ok(json) = serde_json::to_string_pretty(settings) {
            let _ = fs::write(path, json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabs::SendOutcome;
    use providers::ResponderKind;
    use shared::chat::{BotMode, Sender};
    use std::time::Duration;

    fn fresh_state() -> AppState {
        AppState::with_store(UserStore::open_in_memory().unwrap(), AppSettings::default())
    }

    fn wait_for_reply(state: &mut AppState) {
        for _ in 0..500 {
            if state.poll_tabs() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("no reply arrived in time");
    }

    #[test]
    fn login_without_gpu_or_key_yields_a_simple_tab() {
        let mut state = fresh_state();
        state.start_session("ada".to_string(), "", false);

        let session = state.session.as_ref().unwrap();
        assert!(!session.eligible());
        assert_eq!(state.screen, Screen::Chat);
        assert_eq!(state.tabs.len(), 1);
        assert_eq!(
            state.tabs.active_tab().unwrap().responder_kind(),
            ResponderKind::Simple
        );
        assert!(state.prompt_api_setup);
    }

    #[test]
    fn sending_hello_appends_user_and_bot_entries_and_clears_the_placeholder() {
        let mut state = fresh_state();
        state.start_session("ada".to_string(), "", false);
        let welcome_entries = state.tabs.active_tab().unwrap().entries.len();

        state.input_text = "hello".to_string();
        state.send_current();
        assert!(state.tabs.active_tab().unwrap().is_thinking());
        wait_for_reply(&mut state);

        let tab = state.tabs.active_tab().unwrap();
        assert_eq!(tab.entries.len(), welcome_entries + 2);
        let tail: Vec<_> = tab.entries[welcome_entries..]
            .iter()
            .map(|e| e.sender)
            .collect();
        assert_eq!(tail, vec![Sender::User, Sender::Bot]);
        assert!(!tab.is_thinking());
        assert!(state.input_text.is_empty());
    }

    #[test]
    fn busy_tab_rejects_a_second_send_and_keeps_the_input() {
        let mut state = fresh_state();
        state.start_session("ada".to_string(), "", false);

        // Hold the job without running it so the tab stays in flight.
        let _job = match state.tabs.active_tab_mut().unwrap().send("first") {
            SendOutcome::Started(job) => job,
            _ => panic!("first send should start"),
        };
        let entries_before = state.tabs.active_tab().unwrap().entries.len();

        state.input_text = "second".to_string();
        state.send_current();

        assert_eq!(state.input_text, "second");
        assert!(state.banner.is_some());
        assert_eq!(
            state.tabs.active_tab().unwrap().entries.len(),
            entries_before
        );
    }

    #[test]
    fn ineligible_advanced_request_warns_and_new_tabs_stay_simple() {
        let mut state = fresh_state();
        state.start_session("ada".to_string(), "", false);

        state.choose_mode(BotMode::Advanced);
        assert!(state.banner.is_some());
        assert_eq!(
            state.session.as_ref().unwrap().requested_mode(),
            BotMode::Advanced
        );

        state.open_tab();
        assert_eq!(
            state.tabs.active_tab().unwrap().responder_kind(),
            ResponderKind::Simple
        );
    }

    #[test]
    fn mode_switch_rebinds_the_active_tab_only() {
        let mut state = fresh_state();
        state.start_session("ada".to_string(), "sk-key", true);
        state.open_tab();
        assert_eq!(state.tabs.len(), 2);
        assert_eq!(state.tabs.active_index(), 1);
        for tab in state.tabs.tabs() {
            assert_eq!(tab.responder_kind(), ResponderKind::Advanced);
        }

        state.choose_mode(BotMode::Simple);

        let kinds: Vec<_> = state
            .tabs
            .tabs()
            .iter()
            .map(|t| t.responder_kind())
            .collect();
        assert_eq!(kinds, vec![ResponderKind::Advanced, ResponderKind::Simple]);
        assert_eq!(
            state.tabs.active_tab().unwrap().entries.last().unwrap().sender,
            Sender::System
        );
    }

    #[test]
    fn clearing_the_key_forces_simple_and_rebinds_every_tab() {
        let mut state = fresh_state();
        state.store.add("ada", "hunter2", "q", "a").unwrap();
        state.start_session("ada".to_string(), "sk-key", true);
        state.open_tab();

        state.apply_api_key("");

        let session = state.session.as_ref().unwrap();
        assert!(!session.eligible());
        assert_eq!(session.requested_mode(), BotMode::Simple);
        assert_eq!(state.selector.selected, BotMode::Simple);
        for tab in state.tabs.tabs() {
            assert_eq!(tab.responder_kind(), ResponderKind::Simple);
        }
        // And it persisted.
        let record = state.store.verify("ada", "hunter2").unwrap().unwrap();
        assert_eq!(record.api_key, "");
    }

    #[test]
    fn closing_the_last_tab_is_refused_with_a_notice() {
        let mut state = fresh_state();
        state.start_session("ada".to_string(), "", false);
        state.close_tab(0);
        assert_eq!(state.tabs.len(), 1);
        assert!(state.banner.is_some());
    }

    #[test]
    fn registration_logs_straight_in_and_duplicates_are_rejected() {
        let mut state = fresh_state();
        let registration = Registration {
            username: "ada".to_string(),
            password: "hunter2".to_string(),
            security_question: "q".to_string(),
            security_answer: "a".to_string(),
        };
        assert!(state.handle_registration(registration.clone()).is_ok());
        assert_eq!(state.screen, Screen::Chat);
        assert_eq!(state.session.as_ref().unwrap().username(), "ada");

        state.logout();
        assert!(state.handle_registration(registration).is_err());
    }

    #[test]
    fn password_reset_round_trip() {
        let mut state = fresh_state();
        state.store.add("ada", "old-pass", "q", "analytical").unwrap();

        state.handle_forgot_request(ForgotRequest::Reset {
            username: "ada".to_string(),
            security_answer: "wrong".to_string(),
            new_password: "new-pass".to_string(),
        });
        assert!(state.login.info.is_none());

        state.handle_forgot_request(ForgotRequest::Reset {
            username: "ada".to_string(),
            security_answer: "analytical".to_string(),
            new_password: "new-pass".to_string(),
        });
        assert!(state.login.info.is_some());
        assert!(!state.forgot.is_open());
        assert!(state.store.verify("ada", "new-pass").unwrap().is_some());
    }

    #[test]
    fn logout_returns_to_login_in_process() {
        let mut state = fresh_state();
        state.start_session("ada".to_string(), "sk-key", true);
        state.logout();

        assert_eq!(state.screen, Screen::Login);
        assert!(state.session.is_none());
        assert!(state.tabs.is_empty());
    }
}
