//! The advanced responder: a DeepSeek-compatible chat-completion client.
//!
//! One JSON POST per reply, no streaming. Construction validates the API key
//! locally; everything network-shaped surfaces at `respond` time.

use crate::ProviderError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::chat::ChatEntry;
use shared::settings::AdvancedSettings;
use std::sync::LazyLock;
use std::time::Duration;

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

const SYSTEM_PROMPT: &str =
    "You are the advanced assistant inside Confab, a desktop chat client. \
     Answer concisely and helpfully.";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Clone, Debug)]
pub struct AdvancedResponder {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AdvancedResponder {
    /// Fails only on a blank API key; remote problems show up in [`respond`].
    pub fn new(api_key: &str, settings: &AdvancedSettings) -> Result<Self, ProviderError> {
        let key = api_key.trim();
        if key.is_empty() {
            return Err(ProviderError::InvalidKey);
        }
        Ok(Self {
            http: SHARED_HTTP.clone(),
            api_key: key.to_string(),
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn wire_messages(history: &[ChatEntry]) -> Vec<WireMessage> {
        let mut messages = vec![WireMessage {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        }];
        messages.extend(history.iter().filter_map(|entry| {
            entry.sender.wire_role().map(|role| WireMessage {
                role: role.to_string(),
                content: entry.text.clone(),
            })
        }));
        messages
    }

    pub async fn respond(&self, history: &[ChatEntry]) -> Result<String, ProviderError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: Self::wire_messages(history),
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, message });
        }

        let body: ChatCompletionResponse = resp.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::chat::{ChatEntry, Sender};

    #[test]
    fn blank_key_is_rejected() {
        let settings = AdvancedSettings::default();
        assert!(matches!(
            AdvancedResponder::new("", &settings),
            Err(ProviderError::InvalidKey)
        ));
        assert!(matches!(
            AdvancedResponder::new("   \t", &settings),
            Err(ProviderError::InvalidKey)
        ));
    }

    #[test]
    fn key_and_base_url_are_trimmed() {
        let settings = AdvancedSettings {
            model: "deepseek-chat".into(),
            base_url: "https://api.deepseek.com/".into(),
        };
        let r = AdvancedResponder::new("  sk-abc  ", &settings).unwrap();
        assert_eq!(r.api_key, "sk-abc");
        assert_eq!(r.base_url, "https://api.deepseek.com");
    }

    #[test]
    fn wire_messages_keep_dialogue_and_drop_notices() {
        let history = vec![
            ChatEntry::system("Switched to Advanced mode"),
            ChatEntry::user("hello"),
            ChatEntry::bot("hi!"),
            ChatEntry::error("previous call failed"),
            ChatEntry::user("try again"),
        ];
        let wire = AdvancedResponder::wire_messages(&history);

        // Leading system prompt plus the three dialogue entries.
        assert_eq!(wire.len(), 4);
        assert_eq!(wire[0].role, "system");
        assert_eq!(wire[1].role, "user");
        assert_eq!(wire[2].role, "assistant");
        assert_eq!(wire[3].role, "user");
        assert_eq!(wire[3].content, "try again");
        assert!(history[0].sender == Sender::System);
    }
}
