//! Responder implementations and the binding factory.
//!
//! A tab always holds a valid [`Responder`]: either the local rule-based
//! [`SimpleResponder`] or the API-backed [`AdvancedResponder`]. [`bind`] is the
//! only way bindings are produced, and it never fails: an advanced request
//! that cannot be honored degrades to the simple responder with a warning.

pub mod deepseek;
pub mod simple;

pub use deepseek::AdvancedResponder;
pub use simple::SimpleResponder;

use shared::chat::{BotMode, ChatEntry, Sender};
use shared::settings::AdvancedSettings;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API key is empty")]
    InvalidKey,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("response contained no completion")]
    EmptyCompletion,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponderKind {
    Simple,
    Advanced,
}

impl ResponderKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ResponderKind::Simple => "Simple",
            ResponderKind::Advanced => "Advanced",
        }
    }
}

/// The message-answering capability bound to one tab.
///
/// Cloning is cheap (the advanced variant shares its HTTP client) and clones
/// are independent: a worker thread gets its own copy, so rebinding a tab
/// never touches an in-flight call.
#[derive(Clone, Debug)]
pub enum Responder {
    Simple(SimpleResponder),
    Advanced(AdvancedResponder),
}

impl Responder {
    pub fn kind(&self) -> ResponderKind {
        match self {
            Responder::Simple(_) => ResponderKind::Simple,
            Responder::Advanced(_) => ResponderKind::Advanced,
        }
    }

    /// Answer the latest user message given the tab's conversation so far.
    pub async fn respond(&self, history: &[ChatEntry]) -> Result<String, ProviderError> {
        match self {
            Responder::Simple(r) => {
                let last_user = history
                    .iter()
                    .rev()
                    .find(|e| e.sender == Sender::User)
                    .map(|e| e.text.as_str())
                    .unwrap_or_default();
                Ok(r.respond(last_user))
            }
            Responder::Advanced(r) => r.respond(history).await,
        }
    }
}

/// Non-fatal notice that an advanced binding fell back to simple.
#[derive(Clone, Debug)]
pub struct BindWarning {
    pub message: String,
}

/// Resolve a responder for the given mode request.
///
/// Always returns a usable responder. The advanced variant is only attempted
/// when the caller is eligible for it, and any construction failure downgrades
/// to [`SimpleResponder`] with a [`BindWarning`] for the UI.
pub fn bind(
    requested: BotMode,
    eligible: bool,
    api_key: &str,
    advanced: &AdvancedSettings,
) -> (Responder, Option<BindWarning>) {
    if requested == BotMode::Advanced && eligible {
        match AdvancedResponder::new(api_key, advanced) {
            Ok(r) => (Responder::Advanced(r), None),
            Err(e) => {
                tracing::warn!(error = %e, "advanced responder unavailable, using simple");
                (
                    Responder::Simple(SimpleResponder::default()),
                    Some(BindWarning {
                        message: format!(
                            "Could not start the advanced bot ({e}). Using the simple bot instead."
                        ),
                    }),
                )
            }
        }
    } else {
        (Responder::Simple(SimpleResponder::default()), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advanced_settings() -> AdvancedSettings {
        AdvancedSettings::default()
    }

    #[test]
    fn simple_request_binds_simple() {
        let (r, warning) = bind(BotMode::Simple, true, "sk-key", &advanced_settings());
        assert_eq!(r.kind(), ResponderKind::Simple);
        assert!(warning.is_none());
    }

    #[test]
    fn ineligible_advanced_request_binds_simple_without_warning() {
        // Ineligibility is a mode-selection input, not a failure.
        let (r, warning) = bind(BotMode::Advanced, false, "sk-key", &advanced_settings());
        assert_eq!(r.kind(), ResponderKind::Simple);
        assert!(warning.is_none());
    }

    #[test]
    fn eligible_advanced_request_binds_advanced() {
        let (r, warning) = bind(BotMode::Advanced, true, "sk-key", &advanced_settings());
        assert_eq!(r.kind(), ResponderKind::Advanced);
        assert!(warning.is_none());
    }

    #[test]
    fn failed_advanced_construction_falls_back_with_warning() {
        let (r, warning) = bind(BotMode::Advanced, true, "   ", &advanced_settings());
        assert_eq!(r.kind(), ResponderKind::Simple);
        assert!(warning.is_some());
    }
}
