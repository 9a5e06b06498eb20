//! Structural snapshots for no-op write detection.
//!
//! A snapshot is a fingerprint of the parts of the state that matter for
//! persistence: session ids, titles, timestamps as strings, the active
//! flag, and message `{id, role, content}` triples. Comparing snapshots
//! before writing keeps saves idempotent, and comparing them on an
//! external-change signal avoids applying a reload that changes nothing.

use chronicle_types::chat::{ChatSession, Message, MessageRole};
use uuid::Uuid;

/// Fingerprint of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSnapshot {
    pub id: Option<Uuid>,
    pub role: MessageRole,
    pub content: String,
}

/// Fingerprint of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub is_active: bool,
    pub messages: Vec<MessageSnapshot>,
}

/// Fingerprint of the full history state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub active_session_id: Option<Uuid>,
    pub sessions: Vec<SessionSnapshot>,
}

impl StateSnapshot {
    /// Capture a snapshot of the given sessions and active id.
    pub fn capture(sessions: &[ChatSession], active_session_id: Option<Uuid>) -> Self {
        Self {
            active_session_id,
            sessions: sessions
                .iter()
                .map(|session| SessionSnapshot {
                    id: session.id,
                    title: session.title.clone(),
                    created_at: session.created_at.to_rfc3339(),
                    updated_at: session.updated_at.to_rfc3339(),
                    is_active: session.is_active,
                    messages: session
                        .messages
                        .iter()
                        .map(|m| MessageSnapshot {
                            id: m.id,
                            role: m.role,
                            content: m.content.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Order-sensitive structural equality on `{id, role, content}` triples.
pub fn messages_equal(a: &[Message], b: &[Message]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| x.id == y.id && x.role == y.role && x.content == y.content)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_state_captures_equal_snapshots() {
        let mut session = ChatSession::new("a");
        session.messages.push(Message::user("hi"));
        let sessions = vec![session];
        let active = Some(sessions[0].id);

        assert_eq!(
            StateSnapshot::capture(&sessions, active),
            StateSnapshot::capture(&sessions, active)
        );
    }

    #[test]
    fn timestamp_change_changes_the_snapshot() {
        let session = ChatSession::new("a");
        let before = StateSnapshot::capture(std::slice::from_ref(&session), None);

        let mut touched = session;
        touched.updated_at = touched.updated_at + chrono::Duration::seconds(1);
        let after = StateSnapshot::capture(std::slice::from_ref(&touched), None);

        assert_ne!(before, after);
    }

    #[test]
    fn card_context_is_not_part_of_the_fingerprint() {
        let mut session = ChatSession::new("a");
        session.messages.push(Message::assistant("card"));
        let plain = StateSnapshot::capture(std::slice::from_ref(&session), None);

        session.messages[0].card_context = vec![json!({"kind": "news"})];
        let with_card = StateSnapshot::capture(std::slice::from_ref(&session), None);

        assert_eq!(plain, with_card);
    }

    #[test]
    fn messages_equal_is_order_sensitive() {
        let a = vec![Message::user("1"), Message::assistant("2")];
        let b = vec![Message::assistant("2"), Message::user("1")];
        assert!(messages_equal(&a, &a.clone()));
        assert!(!messages_equal(&a, &b));
        assert!(!messages_equal(&a, &a[..1].to_vec()));
    }

    #[test]
    fn messages_equal_sees_id_differences() {
        let mut a = Message::user("same");
        let b = a.clone();
        a.id = Some(Uuid::now_v7());
        assert!(!messages_equal(&[a], &[b]));
    }
}
