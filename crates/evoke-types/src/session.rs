//! Chat session and session registry types.
//!
//! A `Session` is one conversation thread with its own ordered message log
//! and derived metadata (title, preview, message count). The
//! `SessionRegistry` is the ordered, capped collection of all sessions --
//! the single persisted document.
//!
//! JSON field names are camelCase (`lastUpdated`, `messageCount`) to match
//! the persisted layout this engine inherits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::{Message, Role};

/// Title shown for a session that has no user message yet.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Preview shown for a session that has no user message yet.
pub const DEFAULT_PREVIEW: &str = "New conversation";

/// Maximum characters of the last user message used for the derived title.
const TITLE_MAX_CHARS: usize = 30;

/// One conversation thread.
///
/// `title`, `preview` and `message_count` are derived from the message log;
/// they are recomputed on every append or delete, never set directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub title: String,
    pub messages: Vec<Message>,
    pub last_updated: DateTime<Utc>,
    pub preview: String,
    pub message_count: u32,
}

impl Session {
    /// Create an empty session with a fresh time-ordered id.
    ///
    /// `Uuid::now_v7()` embeds the current timestamp plus random entropy,
    /// which keeps collision probability negligible at any realistic
    /// session count.
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            last_updated: Utc::now(),
            preview: DEFAULT_PREVIEW.to_string(),
            message_count: 0,
        }
    }

    /// Append a message and recompute the derived metadata.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.recompute_metadata();
    }

    /// Remove the message at `index`.
    ///
    /// Returns false (and changes nothing) when `index` is out of range.
    pub fn delete_message(&mut self, index: usize) -> bool {
        if index >= self.messages.len() {
            return false;
        }
        self.messages.remove(index);
        self.recompute_metadata();
        true
    }

    /// The most recent user message, if any.
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    fn recompute_metadata(&mut self) {
        self.message_count = self.messages.len() as u32;
        self.last_updated = Utc::now();
        match self.last_user_message().map(|m| m.content.clone()) {
            Some(content) => {
                self.title = derive_title(&content);
                self.preview = content;
            }
            None => {
                self.title = DEFAULT_TITLE.to_string();
                self.preview = DEFAULT_PREVIEW.to_string();
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a session title from a user message: the first 30 characters,
/// with an ellipsis when truncated.
fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let prefix: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{prefix}...")
    } else {
        prefix
    }
}

/// The ordered, capped collection of all sessions.
///
/// Insertion policy: new sessions go to the front; updating an existing
/// session replaces it in place without changing its position. The cap is
/// enforced by truncating from the back (oldest first), and only on
/// insertion -- nothing else deletes sessions implicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the registry holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// All sessions, most recently created first.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// The front (most recently created) session.
    pub fn front(&self) -> Option<&Session> {
        self.sessions.first()
    }

    /// Look up a session by id.
    pub fn get(&self, id: &Uuid) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    /// Mutable lookup by id.
    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| &s.id == id)
    }

    /// Whether a session with this id exists.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.get(id).is_some()
    }

    /// Insert a new session at the front, evicting from the back past `cap`.
    pub fn push_front(&mut self, session: Session, cap: usize) {
        self.sessions.insert(0, session);
        if self.sessions.len() > cap {
            self.sessions.truncate(cap);
        }
    }
}
