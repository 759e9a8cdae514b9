pub mod chat {
    use chrono::Utc;
    use serde::{Deserialize, Serialize};

    /// Which responder family a session or tab is asking for.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum BotMode {
        Simple,
        Advanced,
    }

    impl BotMode {
        pub fn as_str(&self) -> &'static str {
            match self {
                BotMode::Simple => "simple",
                BotMode::Advanced => "advanced",
            }
        }

        pub fn display_name(&self) -> &'static str {
            match self {
                BotMode::Simple => "Simple",
                BotMode::Advanced => "Advanced",
            }
        }
    }

    /// Who produced a chat log entry.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub enum Sender {
        User,
        Bot,
        /// UI notices (mode switches, welcome text). Not part of the dialogue.
        System,
        /// Responder failures, rendered distinctly. Not part of the dialogue.
        Error,
    }

    impl Sender {
        /// Role string for the chat-completion wire format, if this entry
        /// belongs in the conversation history at all.
        pub fn wire_role(&self) -> Option<&'static str> {
            match self {
                Sender::User => Some("user"),
                Sender::Bot => Some("assistant"),
                Sender::System | Sender::Error => None,
            }
        }
    }

    /// One line of a tab's conversation log.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ChatEntry {
        pub sender: Sender,
        pub text: String,
        pub timestamp: String,
    }

    impl ChatEntry {
        pub fn new(sender: Sender, text: impl Into<String>) -> Self {
            Self {
                sender,
                text: text.into(),
                timestamp: Utc::now().format("%H:%M").to_string(),
            }
        }

        pub fn user(text: impl Into<String>) -> Self {
            Self::new(Sender::User, text)
        }

        pub fn bot(text: impl Into<String>) -> Self {
            Self::new(Sender::Bot, text)
        }

        pub fn system(text: impl Into<String>) -> Self {
            Self::new(Sender::System, text)
        }

        pub fn error(text: impl Into<String>) -> Self {
            Self::new(Sender::Error, text)
        }
    }
}

pub mod settings {
    use serde::{Deserialize, Serialize};

    fn default_sidebar_width() -> f32 {
        200.0
    }

    /// Connection settings for the advanced responder.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AdvancedSettings {
        pub model: String,
        pub base_url: String,
    }

    impl Default for AdvancedSettings {
        fn default() -> Self {
            Self {
                model: "deepseek-chat".into(),
                base_url: "https://api.deepseek.com".into(),
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AppSettings {
        pub dark_mode: bool,
        #[serde(default = "default_sidebar_width")]
        pub sidebar_width: f32,
        #[serde(default)]
        pub advanced: AdvancedSettings,
    }

    impl Default for AppSettings {
        fn default() -> Self {
            Self {
                dark_mode: false,
                sidebar_width: default_sidebar_width(),
                advanced: AdvancedSettings::default(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::chat::{ChatEntry, Sender};

    #[test]
    fn wire_roles_cover_dialogue_only() {
        assert_eq!(Sender::User.wire_role(), Some("user"));
        assert_eq!(Sender::Bot.wire_role(), Some("assistant"));
        assert_eq!(Sender::System.wire_role(), None);
        assert_eq!(Sender::Error.wire_role(), None);
    }

    #[test]
    fn entry_constructors_tag_sender() {
        assert_eq!(ChatEntry::user("hi").sender, Sender::User);
        assert_eq!(ChatEntry::error("boom").sender, Sender::Error);
    }
}
