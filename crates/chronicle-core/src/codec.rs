//! Pure size-limiting codec for the persisted session list.
//!
//! No I/O here: every function maps a session list to a smaller session
//! list (or a byte estimate). The storage adapter composes these before
//! each write so the on-disk payload stays inside the configured budget.

use chronicle_types::chat::{ChatSession, Message};
use chronicle_types::config::StoragePolicy;
use serde::Serialize;

/// Serialized byte size of `value`.
///
/// Conservative on failure: a value that cannot be serialized estimates
/// to 0 rather than aborting the caller.
pub fn estimate_size<T: Serialize>(value: &T) -> usize {
    serde_json::to_vec(value).map(|v| v.len()).unwrap_or(0)
}

/// Strip messages down to the minimal persisted set.
///
/// Keeps `role`, `content`, and `card_context` when non-empty. Message
/// ids are dropped; they are reassigned at append time after a reload.
pub fn compress(sessions: &[ChatSession]) -> Vec<ChatSession> {
    sessions
        .iter()
        .map(|session| ChatSession {
            id: session.id,
            title: session.title.clone(),
            messages: session
                .messages
                .iter()
                .map(|m| Message {
                    id: None,
                    role: m.role,
                    content: m.content.clone(),
                    card_context: m.card_context.clone(),
                })
                .collect(),
            created_at: session.created_at,
            updated_at: session.updated_at,
            is_active: session.is_active,
        })
        .collect()
}

/// Keep only the most recent `cap` messages per session.
///
/// Tail truncation: older messages are silently lost. This is accepted
/// lossy policy, not an error.
pub fn limit_messages_per_session(mut sessions: Vec<ChatSession>, cap: usize) -> Vec<ChatSession> {
    for session in &mut sessions {
        if session.messages.len() > cap {
            let excess = session.messages.len() - cap;
            session.messages.drain(..excess);
        }
    }
    sessions
}

/// Drop the least-recently-updated sessions once `max_sessions` is
/// exceeded.
///
/// Ties on `updated_at` break by `created_at`, then by `id`, so eviction
/// is deterministic.
pub fn apply_lru(mut sessions: Vec<ChatSession>, max_sessions: usize) -> Vec<ChatSession> {
    if sessions.len() <= max_sessions {
        return sessions;
    }
    sessions.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    });
    sessions.truncate(max_sessions);
    sessions
}

/// Full storage-safe pipeline: compress, cap messages, evict sessions.
///
/// Compression runs first so size estimates taken by later stages
/// reflect the final on-disk shape.
pub fn optimize(sessions: &[ChatSession], policy: &StoragePolicy) -> Vec<ChatSession> {
    let compressed = compress(sessions);
    let capped = limit_messages_per_session(compressed, policy.max_messages_per_session);
    apply_lru(capped, policy.max_sessions)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use chronicle_types::chat::MessageRole;
    use serde_json::json;
    use uuid::Uuid;

    fn session_updated_at(offset_secs: i64) -> ChatSession {
        let mut session = ChatSession::new(format!("session {offset_secs}"));
        session.updated_at = Utc::now() + Duration::seconds(offset_secs);
        session
    }

    #[test]
    fn estimate_size_is_serialized_length() {
        let sessions = vec![ChatSession::new("a")];
        let expected = serde_json::to_vec(&sessions).unwrap().len();
        assert_eq!(estimate_size(&sessions), expected);
        assert!(estimate_size(&sessions) > 0);
    }

    #[test]
    fn compress_drops_ids_and_keeps_card_context() {
        let mut session = ChatSession::new("a");
        session.messages.push(Message {
            id: Some(Uuid::now_v7()),
            role: MessageRole::User,
            content: "hello".to_string(),
            card_context: Vec::new(),
        });
        session.messages.push(Message {
            id: Some(Uuid::now_v7()),
            role: MessageRole::Assistant,
            content: "card".to_string(),
            card_context: vec![json!({"kind": "stock"})],
        });

        let compressed = compress(&[session]);
        assert_eq!(compressed[0].messages.len(), 2);
        assert!(compressed[0].messages.iter().all(|m| m.id.is_none()));
        assert_eq!(compressed[0].messages[1].card_context.len(), 1);
        assert_eq!(compressed[0].messages[0].content, "hello");
    }

    #[test]
    fn message_cap_keeps_last_entries_in_order() {
        let mut session = ChatSession::new("a");
        for i in 0..10 {
            session.messages.push(Message::user(format!("m{i}")));
        }

        let capped = limit_messages_per_session(vec![session], 4);
        let contents: Vec<_> = capped[0].messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m6", "m7", "m8", "m9"]);
    }

    #[test]
    fn message_cap_leaves_small_sessions_alone() {
        let mut session = ChatSession::new("a");
        session.messages.push(Message::user("only"));
        let capped = limit_messages_per_session(vec![session], 4);
        assert_eq!(capped[0].messages.len(), 1);
    }

    #[test]
    fn lru_keeps_most_recently_updated() {
        let sessions: Vec<_> = (0..5).map(session_updated_at).collect();
        let newest_ids: Vec<_> = sessions[2..].iter().map(|s| s.id).collect();

        let kept = apply_lru(sessions, 3);
        assert_eq!(kept.len(), 3);
        for id in newest_ids {
            assert!(kept.iter().any(|s| s.id == id));
        }
    }

    #[test]
    fn lru_under_limit_is_identity() {
        let sessions: Vec<_> = (0..3).map(session_updated_at).collect();
        let ids: Vec<_> = sessions.iter().map(|s| s.id).collect();
        let kept = apply_lru(sessions, 3);
        // Order untouched when nothing is evicted.
        assert_eq!(kept.iter().map(|s| s.id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn lru_tie_breaks_deterministically() {
        let now = Utc::now();
        let mut a = ChatSession::new("a");
        let mut b = ChatSession::new("b");
        a.created_at = now;
        a.updated_at = now;
        b.created_at = now;
        b.updated_at = now;

        let survivor = apply_lru(vec![a.clone(), b.clone()], 1);
        let survivor_again = apply_lru(vec![b, a], 1);
        // Identical timestamps fall back to the id ordering, so the same
        // session survives regardless of input order.
        assert_eq!(survivor[0].id, survivor_again[0].id);
    }

    #[test]
    fn fifty_one_sessions_drop_exactly_the_oldest() {
        let sessions: Vec<_> = (0..51).map(session_updated_at).collect();
        let oldest = sessions[0].id;

        let kept = apply_lru(sessions, 50);
        assert_eq!(kept.len(), 50);
        assert!(!kept.iter().any(|s| s.id == oldest));
    }

    #[test]
    fn optimize_composes_all_stages() {
        let policy = StoragePolicy {
            max_sessions: 2,
            max_messages_per_session: 1,
            ..StoragePolicy::default()
        };

        let mut sessions: Vec<_> = (0..3).map(session_updated_at).collect();
        for session in &mut sessions {
            session.messages.push(Message {
                id: Some(Uuid::now_v7()),
                role: MessageRole::User,
                content: "first".to_string(),
                card_context: Vec::new(),
            });
            session.messages.push(Message::assistant("second"));
        }

        let optimized = optimize(&sessions, &policy);
        assert_eq!(optimized.len(), 2);
        for session in &optimized {
            assert_eq!(session.messages.len(), 1);
            assert_eq!(session.messages[0].content, "second");
            assert!(session.messages[0].id.is_none());
        }
    }
}
