//! Conversation tabs and the tab strip.
//!
//! Each tab owns its responder binding and its message log; nothing is shared
//! between tabs. A tab allows one in-flight request at a time: `send` hands
//! back a [`SendJob`] snapshot for a worker thread and the reply comes home
//! through an mpsc channel polled every frame.

use providers::{bind, BindWarning, Responder, ResponderKind};
use shared::chat::{BotMode, ChatEntry};
use shared::settings::AdvancedSettings;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

const SIMPLE_WELCOME: &str = "You're chatting with the simple bot. To unlock the \
advanced bot, add a valid API key in API Settings (GPU support required).";

/// Work handed to the background worker: an owned responder clone plus the
/// conversation snapshot it should answer.
pub struct SendJob {
    pub responder: Responder,
    pub history: Vec<ChatEntry>,
    pub reply_tx: Sender<Result<String, String>>,
}

pub enum SendOutcome {
    /// User entry appended; run the job on a worker and the tab will pick the
    /// reply up via [`ChatTab::poll`].
    Started(SendJob),
    /// Empty or whitespace-only input; log untouched.
    RejectedEmpty,
    /// A request is already in flight on this tab; log untouched.
    RejectedBusy,
}

pub struct ChatTab {
    pub id: usize,
    pub title: String,
    responder: Responder,
    pub entries: Vec<ChatEntry>,
    reply_rx: Option<Receiver<Result<String, String>>>,
}

impl ChatTab {
    fn new(id: usize, responder: Responder) -> Self {
        let mut tab = Self {
            id,
            title: format!("Chat {id}"),
            responder,
            entries: Vec::new(),
            reply_rx: None,
        };
        if tab.responder_kind() == ResponderKind::Simple {
            tab.entries.push(ChatEntry::system(SIMPLE_WELCOME));
        }
        tab
    }

    pub fn responder_kind(&self) -> ResponderKind {
        self.responder.kind()
    }

    /// A reply is pending; the UI shows the transient thinking placeholder.
    pub fn is_thinking(&self) -> bool {
        self.reply_rx.is_some()
    }

    pub fn send(&mut self, text: &str) -> SendOutcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SendOutcome::RejectedEmpty;
        }
        if self.reply_rx.is_some() {
            return SendOutcome::RejectedBusy;
        }

        self.entries.push(ChatEntry::user(trimmed));
        let (reply_tx, reply_rx) = channel();
        self.reply_rx = Some(reply_rx);
        SendOutcome::Started(SendJob {
            responder: self.responder.clone(),
            history: self.entries.clone(),
            reply_tx,
        })
    }

    /// Check for a finished reply. Returns true when the log changed.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = &self.reply_rx else {
            return false;
        };
        match rx.try_recv() {
            Ok(result) => {
                self.finish_send(result);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.finish_send(Err("the responder stopped unexpectedly".to_string()));
                true
            }
        }
    }

    /// Record the reply (or the failure) and clear the in-flight marker. The
    /// thinking placeholder disappears with the marker; it was never a log
    /// entry, so the response replaces it rather than stacking under it.
    pub fn finish_send(&mut self, result: Result<String, String>) {
        self.reply_rx = None;
        match result {
            Ok(text) => self.entries.push(ChatEntry::bot(text)),
            Err(message) => {
                tracing::warn!(tab = self.id, error = %message, "responder failed");
                self.entries.push(ChatEntry::error(message));
            }
        }
    }

    /// Re-resolve the responder after a mode or key change. The log is kept.
    pub fn update_binding(
        &mut self,
        api_key: &str,
        use_advanced: bool,
        advanced: &AdvancedSettings,
    ) -> Option<BindWarning> {
        let requested = if use_advanced { BotMode::Advanced } else { BotMode::Simple };
        let (responder, warning) = bind(requested, use_advanced, api_key, advanced);
        self.responder = responder;
        warning
    }
}

pub enum CloseOutcome {
    Closed,
    /// The last remaining tab stays open.
    LastTab,
}

pub struct TabStrip {
    tabs: Vec<ChatTab>,
    active: usize,
    next_ordinal: usize,
}

impl TabStrip {
    pub fn new() -> Self {
        Self {
            tabs: Vec::new(),
            active: 0,
            next_ordinal: 1,
        }
    }

    /// Open a new tab bound to `responder` and focus it.
    pub fn open(&mut self, responder: Responder) -> &ChatTab {
        let id = self.next_ordinal;
        self.next_ordinal += 1;
        self.tabs.push(ChatTab::new(id, responder));
        self.active = self.tabs.len() - 1;
        &self.tabs[self.active]
    }

    pub fn close(&mut self, index: usize) -> CloseOutcome {
        if self.tabs.len() <= 1 {
            return CloseOutcome::LastTab;
        }
        if index >= self.tabs.len() {
            return CloseOutcome::Closed;
        }
        self.tabs.remove(index);
        if self.active >= self.tabs.len() {
            self.active = self.tabs.len() - 1;
        } else if self.active > index {
            self.active -= 1;
        }
        CloseOutcome::Closed
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn set_active(&mut self, index: usize) {
        if index < self.tabs.len() {
            self.active = index;
        }
    }

    pub fn active_tab(&self) -> Option<&ChatTab> {
        self.tabs.get(self.active)
    }

    pub fn active_tab_mut(&mut self) -> Option<&mut ChatTab> {
        self.tabs.get_mut(self.active)
    }

    pub fn tabs(&self) -> &[ChatTab] {
        &self.tabs
    }

    pub fn tabs_mut(&mut self) -> &mut [ChatTab] {
        &mut self.tabs
    }

    pub fn any_thinking(&self) -> bool {
        self.tabs.iter().any(|t| t.is_thinking())
    }

    /// Poll every tab; true when any log changed.
    pub fn poll_all(&mut self) -> bool {
        let mut changed = false;
        for tab in &mut self.tabs {
            changed |= tab.poll();
        }
        changed
    }
}

impl Default for TabStrip {
    fn default() -> Self {
        Self::new()
    }
}
