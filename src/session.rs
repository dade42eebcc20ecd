//! Client chat session.
//!
//! `ChatSession` is the explicit state a client carries between messages:
//! persisted history, interest counters, display settings, and the transcript
//! currently on screen. Opening a session replays storage; every mutation is
//! written through immediately.
//!
//! Lifecycle notices (the welcome-back greeting, the recall notice, and the
//! "Chat cleared." acknowledgement) appear in the transcript only. Everything
//! else the bot says is also appended to the persisted history.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::client::{ChatTransport, ClientError};
use crate::interest::{Interest, InterestTracker};
use crate::matcher::DEFAULT_RESPONSE;
use crate::storage::{ClientStorage, Theme};
use crate::suggest::{self, Suggestion};

pub const RECALL_NOTICE: &str = "I remember some of the things you were interested in last time.";
pub const CLEARED_NOTICE: &str = "Chat cleared.";
pub const SERVER_ERROR_NOTICE: &str = "Oops, something went wrong on the server.";
pub const UNREACHABLE_NOTICE: &str = "Unable to reach the server.";

/// Who said it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One message in the history or transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistoryEntry {
    pub text: String,
    pub sender: Sender,
    #[serde(default)]
    pub redirect: Option<String>,
}

impl ChatHistoryEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            redirect: None,
        }
    }

    pub fn bot(text: impl Into<String>, redirect: Option<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Bot,
            redirect,
        }
    }
}

impl From<Suggestion> for ChatHistoryEntry {
    fn from(s: Suggestion) -> Self {
        Self::bot(s.text, s.redirect)
    }
}

#[derive(Debug)]
pub struct ChatSession {
    storage: ClientStorage,
    tracker: InterestTracker,
    history: Vec<ChatHistoryEntry>,
    transcript: Vec<ChatHistoryEntry>,
    name: String,
    theme: Theme,
}

impl ChatSession {
    /// Restore a session: interests first, then history, then settings.
    pub fn open(storage: ClientStorage) -> Self {
        let tracker = InterestTracker::load(storage.clone());
        let history = storage.load_history();
        let transcript = history.clone();

        let mut session = Self {
            storage,
            tracker,
            history,
            transcript,
            name: String::new(),
            theme: Theme::default(),
        };

        if let Some(name) = session.storage.load_name().filter(|n| !n.is_empty()) {
            session.notice(format!("Welcome back, {name}!"));
            session.name = name;
        }
        session.theme = session.storage.load_theme();

        if session.recall().is_some() {
            session.notice(RECALL_NOTICE);
        }
        session
    }

    /// Send a message and collect the bot's answers.
    ///
    /// Returns the bot entries appended for this message: the reply (or an
    /// error notice) followed by at most one suggestion. A blank message is
    /// ignored.
    pub fn send(&mut self, message: &str, transport: &dyn ChatTransport) -> Vec<ChatHistoryEntry> {
        let message = message.trim();
        if message.is_empty() {
            return Vec::new();
        }

        self.append(ChatHistoryEntry::user(message));
        let latest = self.tracker.observe(message);

        let mut replies = Vec::with_capacity(2);
        match transport.chat(message) {
            Ok(reply) => {
                let text = if reply.message.is_empty() {
                    DEFAULT_RESPONSE.to_string()
                } else {
                    reply.message
                };
                replies.push(ChatHistoryEntry::bot(text, reply.redirect));
                if let Some(suggestion) = self.suggestion(&latest) {
                    replies.push(suggestion.into());
                }
            }
            Err(ClientError::Status { status }) => {
                tracing::warn!(status, "chat request rejected by server");
                replies.push(ChatHistoryEntry::bot(SERVER_ERROR_NOTICE, None));
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                replies.push(ChatHistoryEntry::bot(UNREACHABLE_NOTICE, None));
            }
        }

        for reply in &replies {
            self.append(reply.clone());
        }
        replies
    }

    /// Persist name and theme; greet the user when a name is given.
    pub fn save_settings(&mut self, name: &str, theme: Theme) {
        let name = name.trim();
        self.storage.save_name(name);
        self.storage.save_theme(theme);
        self.name = name.to_string();
        self.theme = theme;

        if !name.is_empty() {
            self.append(ChatHistoryEntry::bot(format!("Nice to meet you, {name}!"), None));
        }
    }

    /// Forget everything: storage keys, history, interests, and settings.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.history.clear();
        self.tracker.reset();
        self.transcript.clear();
        self.name.clear();
        self.theme = Theme::default();
        self.notice(CLEARED_NOTICE);
    }

    /// Suggestion based on stored interests and this message's keywords.
    pub fn suggestion(&self, latest: &BTreeSet<Interest>) -> Option<Suggestion> {
        suggest::suggest(self.tracker.counters(), latest)
    }

    /// Suggestion from prior interests alone.
    pub fn recall(&self) -> Option<Suggestion> {
        self.suggestion(&BTreeSet::new())
    }

    pub fn history(&self) -> &[ChatHistoryEntry] {
        &self.history
    }

    pub fn transcript(&self) -> &[ChatHistoryEntry] {
        &self.transcript
    }

    pub fn tracker(&self) -> &InterestTracker {
        &self.tracker
    }

    /// Display name; empty when unset.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    fn append(&mut self, entry: ChatHistoryEntry) {
        self.transcript.push(entry.clone());
        self.history.push(entry);
        self.storage.save_history(&self.history);
    }

    fn notice(&mut self, text: impl Into<String>) {
        self.transcript.push(ChatHistoryEntry::bot(text, None));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientResult, LocalTransport};
    use crate::matcher::Reply;
    use crate::rules::RuleTable;
    use crate::storage::MemoryStore;

    const RULES: &str = "keyword,response,redirect_page
help,Here is some help,help.html
joke,Knock knock.
";

    struct Failing(fn() -> ClientError);

    impl ChatTransport for Failing {
        fn chat(&self, _message: &str) -> ClientResult<Reply> {
            Err((self.0)())
        }
    }

    fn local() -> LocalTransport {
        LocalTransport::new(RuleTable::load(RULES))
    }

    #[test]
    fn send_records_user_and_reply() {
        let mut session = ChatSession::open(ClientStorage::new(MemoryStore::new()));
        let replies = session.send("  I need help  ", &local());

        assert_eq!(replies, vec![ChatHistoryEntry::bot(
            "Here is some help",
            Some("help.html".into())
        )]);
        assert_eq!(session.history()[0], ChatHistoryEntry::user("I need help"));
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.tracker().counters().get(Interest::Help), 1);
    }

    #[test]
    fn blank_message_is_ignored() {
        let mut session = ChatSession::open(ClientStorage::new(MemoryStore::new()));
        assert!(session.send("   ", &local()).is_empty());
        assert!(session.history().is_empty());
    }

    #[test]
    fn second_hit_adds_suggestion() {
        let mut session = ChatSession::open(ClientStorage::new(MemoryStore::new()));
        assert_eq!(session.send("joke", &local()).len(), 1);

        let replies = session.send("another joke", &local());
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].text, "Knock knock.");
        assert!(replies[1].text.starts_with("I remember you enjoy jokes"));
        assert_eq!(replies[1].redirect, None);
    }

    #[test]
    fn transport_failures_become_notices() {
        let mut session = ChatSession::open(ClientStorage::new(MemoryStore::new()));

        let replies = session.send("hi", &Failing(|| ClientError::Status { status: 500 }));
        assert_eq!(replies, vec![ChatHistoryEntry::bot(SERVER_ERROR_NOTICE, None)]);

        let replies = session.send("hi", &Failing(|| ClientError::Request {
            message: "connection refused".into(),
        }));
        assert_eq!(replies, vec![ChatHistoryEntry::bot(UNREACHABLE_NOTICE, None)]);
    }

    #[test]
    fn failed_request_still_counts_interest_but_skips_suggestion() {
        let mut session = ChatSession::open(ClientStorage::new(MemoryStore::new()));
        let down = Failing(|| ClientError::Request {
            message: "down".into(),
        });
        session.send("help", &down);
        let replies = session.send("help", &down);
        assert_eq!(replies.len(), 1);
        assert_eq!(session.tracker().counters().get(Interest::Help), 2);
    }

    #[test]
    fn reopen_replays_history_and_greets() {
        let store = MemoryStore::new();
        {
            let mut session = ChatSession::open(ClientStorage::new(store.clone()));
            session.save_settings(" Ada ", Theme::Dark);
            session.send("help", &local());
            session.send("help again", &local());
        }

        let session = ChatSession::open(ClientStorage::new(store));
        assert_eq!(session.name(), "Ada");
        assert_eq!(session.theme(), Theme::Dark);

        let history = session.history();
        assert_eq!(history[0].text, "Nice to meet you, Ada!");
        // settings ack + 2 × (user, reply) + one suggestion
        assert_eq!(history.len(), 6);

        let transcript = session.transcript();
        assert_eq!(transcript.len(), history.len() + 2);
        assert_eq!(transcript[history.len()].text, "Welcome back, Ada!");
        assert_eq!(transcript[history.len() + 1].text, RECALL_NOTICE);
    }

    #[test]
    fn welcome_back_is_not_persisted() {
        let store = MemoryStore::new();
        ChatSession::open(ClientStorage::new(store.clone())).save_settings("Ada", Theme::Dark);

        for _ in 0..3 {
            let session = ChatSession::open(ClientStorage::new(store.clone()));
            assert_eq!(session.transcript().last().unwrap().text, "Welcome back, Ada!");
            assert_eq!(session.history(), &[ChatHistoryEntry::bot(
                "Nice to meet you, Ada!",
                None
            )]);
        }
    }

    #[test]
    fn clear_resets_state_and_reload_is_blank() {
        let store = MemoryStore::new();
        let mut session = ChatSession::open(ClientStorage::new(store.clone()));
        session.save_settings("Ada", Theme::Dark);
        session.send("joke", &local());
        session.send("joke", &local());

        session.clear();
        assert_eq!(session.transcript(), &[ChatHistoryEntry::bot(CLEARED_NOTICE, None)]);
        assert!(session.history().is_empty());
        assert!(session.tracker().counters().is_empty());
        assert_eq!(session.theme(), Theme::Light);
        assert!(store.snapshot().is_empty());

        let reloaded = ChatSession::open(ClientStorage::new(store));
        assert_eq!(reloaded.theme(), Theme::Light);
        assert!(reloaded.transcript().is_empty());
        assert!(reloaded.recall().is_none());
        assert_eq!(reloaded.name(), "");
    }

    #[test]
    fn empty_name_does_not_greet() {
        let mut session = ChatSession::open(ClientStorage::new(MemoryStore::new()));
        session.save_settings("   ", Theme::Light);
        assert!(session.transcript().is_empty());
    }
}
