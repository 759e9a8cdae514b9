//! The offline responder: a handful of keyword rules and a reflective
//! fallback. No network, no failure modes.

#[derive(Clone, Debug, Default)]
pub struct SimpleResponder;

impl SimpleResponder {
    /// Always produces a reply; never errors.
    pub fn respond(&self, text: &str) -> String {
        let lower = text.trim().to_lowercase();

        if lower.is_empty() {
            return "I didn't catch that - try typing a message.".to_string();
        }

        if lower.starts_with("hello")
            || lower.starts_with("hey")
            || lower == "hi"
            || lower.starts_with("hi ")
        {
            return "Hello! I'm the simple bot - I run entirely on your machine. \
                    Ask me anything, or set up an API key to unlock the advanced bot."
                .to_string();
        }

        if lower.contains("how are you") {
            return "Running smoothly, thanks for asking. What can I do for you?".to_string();
        }

        if lower.contains("your name") || lower.contains("who are you") {
            return "I'm Confab's built-in assistant. The advanced bot lives behind \
                    an API key; I'm the one that always works offline."
                .to_string();
        }

        if lower.contains("help") {
            return "I can hold a basic conversation without any setup. For deeper \
                    answers, open API Settings in the sidebar and add a key to \
                    enable the advanced bot."
                .to_string();
        }

        if lower.contains("thank") {
            return "You're welcome!".to_string();
        }

        if lower.contains("bye") || lower.contains("goodbye") {
            return "Goodbye! Your conversation stays right here in this tab.".to_string();
        }

        if lower.ends_with('?') {
            return format!(
                "Good question. I'm only a small offline bot, so I'll be honest: I \
                 don't know. You asked: \"{}\" - the advanced bot could take a \
                 proper swing at that.",
                text.trim()
            );
        }

        format!(
            "I hear you: \"{}\". Tell me more, or ask me a question.",
            text.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greets_back() {
        let bot = SimpleResponder;
        assert!(bot.respond("hello there").contains("simple bot"));
    }

    #[test]
    fn never_returns_empty() {
        let bot = SimpleResponder;
        for input in ["", "   ", "hi", "why?", "the weather is nice"] {
            assert!(!bot.respond(input).is_empty());
        }
    }

    #[test]
    fn reflects_statements() {
        let bot = SimpleResponder;
        assert!(bot.respond("rust is fun").contains("rust is fun"));
    }
}
