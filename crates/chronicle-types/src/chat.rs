//! Chat message, session, and history-state types for chronicle.
//!
//! These types model the durable multi-session conversation store:
//! individual messages, the sessions that own them, and the full
//! persisted history state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Author role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message within a conversation transcript.
///
/// Messages are immutable once created. `id` is assigned at append time
/// when absent and is omitted from the persisted form. `card_context` is
/// an optional auxiliary payload (flexible JSON, potentially large)
/// attached to assistant messages; it is omitted when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub card_context: Vec<serde_json::Value>,
}

impl Message {
    /// Create a user message with no id assigned yet.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: MessageRole::User,
            content: content.into(),
            card_context: Vec::new(),
        }
    }

    /// Create an assistant message with no id assigned yet.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: MessageRole::Assistant,
            content: content.into(),
            card_context: Vec::new(),
        }
    }
}

/// One logical conversation thread with its own transcript and metadata.
///
/// `messages` is insertion-ordered and is the canonical conversation
/// record. `is_active` is advisory only; the authoritative active id
/// lives on [`ChatHistoryState`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl ChatSession {
    /// Create a new empty session with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title: title.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            is_active: false,
        }
    }
}

/// The full history for one storage namespace: every session plus the
/// currently active session id.
///
/// If `active_session_id` is `Some` it references a session present in
/// `sessions`, except transiently while the active session is being
/// deleted (it then resolves to `None`).
#[derive(Debug, Clone)]
pub struct ChatHistoryState {
    pub sessions: Vec<ChatSession>,
    pub active_session_id: Option<Uuid>,
    pub max_sessions: usize,
}

impl ChatHistoryState {
    /// State with no sessions and no active id.
    pub fn empty(max_sessions: usize) -> Self {
        Self {
            sessions: Vec::new(),
            active_session_id: None,
            max_sessions,
        }
    }

    /// Look up a session by id.
    pub fn session(&self, id: Uuid) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Mutable session lookup.
    pub fn session_mut(&mut self, id: Uuid) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// The session the active id points at, if any.
    pub fn active_session(&self) -> Option<&ChatSession> {
        self.active_session_id.and_then(|id| self.session(id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn message_role_serde_lowercase() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let parsed: MessageRole = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, MessageRole::Assistant);
    }

    #[test]
    fn message_omits_absent_id_and_empty_context() {
        let msg = Message::user("hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("\"id\""));
        assert!(!json.contains("card_context"));
    }

    #[test]
    fn message_json_roundtrip_with_card_context() {
        let msg = Message {
            id: Some(Uuid::now_v7()),
            role: MessageRole::Assistant,
            content: "here is a card".to_string(),
            card_context: vec![json!({"kind": "weather", "temp_c": 21})],
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("card_context"));

        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn message_decodes_minimal_persisted_form() {
        // The persisted form carries only role and content.
        let parsed: Message = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
        assert_eq!(parsed.id, None);
        assert_eq!(parsed.role, MessageRole::User);
        assert!(parsed.card_context.is_empty());
    }

    #[test]
    fn session_timestamps_serialize_as_rfc3339() {
        let session = ChatSession::new("Test chat");
        let json = serde_json::to_string(&session).unwrap();
        // RFC 3339 strings, reconstructed into DateTime on load.
        let parsed: ChatSession = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.created_at, session.created_at);
        assert_eq!(parsed.updated_at, session.updated_at);
    }

    #[test]
    fn new_session_is_empty_and_inactive() {
        let session = ChatSession::new("fresh");
        assert!(session.messages.is_empty());
        assert!(!session.is_active);
        assert!(session.updated_at >= session.created_at);
    }

    #[test]
    fn state_lookups() {
        let mut state = ChatHistoryState::empty(50);
        assert!(state.active_session().is_none());

        let session = ChatSession::new("one");
        let id = session.id;
        state.sessions.push(session);
        state.active_session_id = Some(id);

        assert_eq!(state.session(id).unwrap().title, "one");
        assert_eq!(state.active_session().unwrap().id, id);
        assert!(state.session(Uuid::now_v7()).is_none());
    }
}
