//! Per-login session state and the mode lifecycle.
//!
//! The session owns the username, the API key, the eligibility flag, and the
//! requested bot mode. Eligibility is always recomputed from its inputs;
//! nothing else may set it. Transitions return [`SessionEvent`]s for the UI to
//! surface; they never fail.

use shared::chat::BotMode;

/// Advanced-mode eligibility: a GPU plus a non-blank API key.
pub fn compute_eligibility(gpu_available: bool, api_key: &str) -> bool {
    gpu_available && !api_key.trim().is_empty()
}

/// How far a mode or key change propagates across open tabs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RebindScope {
    ActiveTabOnly,
    AllTabs,
}

/// A mode switch rebinds only the tab the user is looking at. Inherited
/// product behavior, kept on purpose; see DESIGN.md for the open question.
pub const MODE_SWITCH_REBIND_SCOPE: RebindScope = RebindScope::ActiveTabOnly;

/// An API-key update from the settings dialog rebinds every open tab.
pub const API_KEY_REBIND_SCOPE: RebindScope = RebindScope::AllTabs;

/// Notices emitted by session transitions, drained by the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Advanced mode was requested without eligibility. The request is
    /// recorded anyway; new tabs will quietly get the simple responder.
    AdvancedUnavailable,
    /// Losing eligibility forced the requested mode back to Simple; the mode
    /// selector needs to reflect that.
    ModeForcedSimple,
    /// Eligibility flipped; selector status lines should refresh.
    EligibilityChanged(bool),
}

pub struct Session {
    username: String,
    api_key: String,
    gpu_available: bool,
    eligible: bool,
    requested_mode: BotMode,
}

impl Session {
    pub fn new(username: impl Into<String>, api_key: &str, gpu_available: bool) -> Self {
        let api_key = api_key.trim().to_string();
        let eligible = compute_eligibility(gpu_available, &api_key);
        Self {
            username: username.into(),
            api_key,
            gpu_available,
            eligible,
            // Start in the best mode the capabilities allow.
            requested_mode: if eligible { BotMode::Advanced } else { BotMode::Simple },
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn eligible(&self) -> bool {
        self.eligible
    }

    pub fn requested_mode(&self) -> BotMode {
        self.requested_mode
    }

    /// The mode new tabs actually get: advanced only when both requested and
    /// eligible.
    pub fn effective_mode(&self) -> BotMode {
        if self.requested_mode == BotMode::Advanced && self.eligible {
            BotMode::Advanced
        } else {
            BotMode::Simple
        }
    }

    pub fn use_advanced(&self) -> bool {
        self.effective_mode() == BotMode::Advanced
    }

    /// Record a user mode choice. Requesting advanced without eligibility is
    /// allowed; it just warns and resolves to simple behavior.
    pub fn request_mode(&mut self, mode: BotMode) -> Vec<SessionEvent> {
        tracing::info!(mode = mode.as_str(), eligible = self.eligible, "mode requested");
        self.requested_mode = mode;
        if mode == BotMode::Advanced && !self.eligible {
            vec![SessionEvent::AdvancedUnavailable]
        } else {
            Vec::new()
        }
    }

    /// Store a new API key and recompute eligibility. If the advanced request
    /// can no longer be honored, the requested mode snaps back to Simple.
    pub fn update_api_key(&mut self, api_key: &str) -> Vec<SessionEvent> {
        self.api_key = api_key.trim().to_string();
        let was_eligible = self.eligible;
        self.eligible = compute_eligibility(self.gpu_available, &self.api_key);

        let mut events = Vec::new();
        if was_eligible != self.eligible {
            tracing::info!(eligible = self.eligible, "eligibility changed");
            events.push(SessionEvent::EligibilityChanged(self.eligible));
        }
        if !self.eligible && self.requested_mode == BotMode::Advanced {
            self.requested_mode = BotMode::Simple;
            events.push(SessionEvent::ModeForcedSimple);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligibility_truth_table() {
        assert!(!compute_eligibility(false, ""));
        assert!(!compute_eligibility(false, "sk-key"));
        assert!(!compute_eligibility(true, ""));
        assert!(!compute_eligibility(true, "   "));
        assert!(compute_eligibility(true, "sk-key"));
    }

    #[test]
    fn initial_mode_follows_eligibility() {
        assert_eq!(
            Session::new("ada", "sk-key", true).requested_mode(),
            BotMode::Advanced
        );
        assert_eq!(
            Session::new("ada", "sk-key", false).requested_mode(),
            BotMode::Simple
        );
        assert_eq!(Session::new("ada", "", true).requested_mode(), BotMode::Simple);
    }

    #[test]
    fn ineligible_advanced_request_is_recorded_but_resolves_simple() {
        let mut session = Session::new("ada", "", false);
        let events = session.request_mode(BotMode::Advanced);

        assert_eq!(events, vec![SessionEvent::AdvancedUnavailable]);
        assert_eq!(session.requested_mode(), BotMode::Advanced);
        assert_eq!(session.effective_mode(), BotMode::Simple);
        assert!(!session.use_advanced());
    }

    #[test]
    fn clearing_the_key_forces_simple_and_notifies() {
        let mut session = Session::new("ada", "sk-key", true);
        assert!(session.use_advanced());

        let events = session.update_api_key("");
        assert_eq!(
            events,
            vec![
                SessionEvent::EligibilityChanged(false),
                SessionEvent::ModeForcedSimple,
            ]
        );
        assert_eq!(session.requested_mode(), BotMode::Simple);
        assert!(!session.eligible());
    }

    #[test]
    fn gaining_a_key_restores_eligibility_but_not_the_mode() {
        let mut session = Session::new("ada", "", true);
        assert_eq!(session.requested_mode(), BotMode::Simple);

        let events = session.update_api_key("sk-key");
        assert_eq!(events, vec![SessionEvent::EligibilityChanged(true)]);
        // The user still has to pick advanced themselves.
        assert_eq!(session.requested_mode(), BotMode::Simple);
        assert!(session.eligible());
    }

    #[test]
    fn key_is_stored_trimmed() {
        let mut session = Session::new("ada", "  sk-key  ", true);
        assert_eq!(session.api_key(), "sk-key");
        session.update_api_key("  sk-two ");
        assert_eq!(session.api_key(), "sk-two");
    }

    #[test]
    fn without_gpu_no_key_helps() {
        let mut session = Session::new("ada", "", false);
        let events = session.update_api_key("sk-key");
        assert!(events.is_empty());
        assert!(!session.eligible());
    }

    #[test]
    fn rebind_scopes_are_the_documented_policy() {
        assert_eq!(MODE_SWITCH_REBIND_SCOPE, RebindScope::ActiveTabOnly);
        assert_eq!(API_KEY_REBIND_SCOPE, RebindScope::AllTabs);
    }
}
