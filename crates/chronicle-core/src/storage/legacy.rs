//! One-time migration of the legacy flat history format.
//!
//! Older deployments persisted a bare `Message` array under the
//! `chat-history` key. Migration wraps that array into a single
//! synthetic session, keeps a backup of the raw payload, and retires the
//! old key so the upgrade runs at most once per namespace.

use chrono::{Duration, Utc};
use chronicle_types::chat::{ChatSession, Message};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::storage::adapter::{LEGACY_BACKUP_KEY, LEGACY_KEY};
use crate::storage::medium::StorageMedium;

/// Title given to the synthetic session holding migrated history.
pub const MIGRATED_SESSION_TITLE: &str = "Imported conversation";

/// Convert the legacy flat message array into a single session.
///
/// Returns `None` (and never fails) when the legacy key is absent, holds
/// anything other than a non-empty message array, or was already
/// migrated. On success the raw payload is copied to a backup key and
/// the legacy key is removed.
pub fn migrate_legacy<M: StorageMedium>(medium: &M) -> Option<ChatSession> {
    let raw = match medium.get(LEGACY_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            debug!("legacy history unreadable: {err}");
            return None;
        }
    };

    let messages: Vec<Message> = match serde_json::from_str(&raw) {
        Ok(messages) => messages,
        Err(err) => {
            debug!("legacy history is not a message array: {err}");
            return None;
        }
    };
    if messages.is_empty() {
        return None;
    }

    let now = Utc::now();
    let session = ChatSession {
        id: Uuid::now_v7(),
        title: MIGRATED_SESSION_TITLE.to_string(),
        messages,
        // Approximate: the legacy format never recorded when the
        // conversation started.
        created_at: now - Duration::days(1),
        updated_at: now,
        is_active: true,
    };

    if let Err(err) = medium.set(LEGACY_BACKUP_KEY, &raw) {
        warn!("failed to back up legacy history: {err}");
    }
    if let Err(err) = medium.remove(LEGACY_KEY) {
        warn!("failed to retire legacy history key: {err}");
    }

    info!(
        messages = session.messages.len(),
        "migrated legacy chat history"
    );
    Some(session)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::medium::testing::TestMedium;

    #[test]
    fn missing_key_is_a_noop() {
        let medium = TestMedium::new();
        assert!(migrate_legacy(&medium).is_none());
        assert!(!medium.contains(LEGACY_BACKUP_KEY));
    }

    #[test]
    fn two_legacy_messages_become_one_active_session() {
        let medium = TestMedium::new();
        medium.insert_raw(
            LEGACY_KEY,
            r#"[{"role":"user","content":"u1"},{"role":"assistant","content":"a1"}]"#,
        );

        let session = migrate_legacy(&medium).unwrap();
        assert_eq!(session.title, MIGRATED_SESSION_TITLE);
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].content, "u1");
        assert_eq!(session.messages[1].content, "a1");
        assert!(session.is_active);
        assert!(session.created_at < session.updated_at);
    }

    #[test]
    fn migration_backs_up_and_retires_the_key() {
        let medium = TestMedium::new();
        let payload = r#"[{"role":"user","content":"keep me"}]"#;
        medium.insert_raw(LEGACY_KEY, payload);

        migrate_legacy(&medium).unwrap();
        assert_eq!(medium.raw(LEGACY_BACKUP_KEY).unwrap(), payload);
        assert!(!medium.contains(LEGACY_KEY));
    }

    #[test]
    fn second_run_yields_no_duplicate_session() {
        let medium = TestMedium::new();
        medium.insert_raw(LEGACY_KEY, r#"[{"role":"user","content":"once"}]"#);

        assert!(migrate_legacy(&medium).is_some());
        assert!(migrate_legacy(&medium).is_none());
    }

    #[test]
    fn empty_array_is_a_noop() {
        let medium = TestMedium::new();
        medium.insert_raw(LEGACY_KEY, "[]");
        assert!(migrate_legacy(&medium).is_none());
    }

    #[test]
    fn non_array_payload_is_a_noop() {
        let medium = TestMedium::new();
        medium.insert_raw(LEGACY_KEY, r#"{"role":"user","content":"not an array"}"#);
        assert!(migrate_legacy(&medium).is_none());
        // The payload stays put; there is no safe recovery beyond
        // starting fresh.
        assert!(medium.contains(LEGACY_KEY));
    }
}
