//! Storage adapter: load/save of the full history state.
//!
//! The adapter is the only component that touches the persistence
//! medium. Saves run the codec pipeline first, enforce the byte budget,
//! and publish a change event after every successful write so sibling
//! store instances reload.

use std::sync::Arc;

use chronicle_types::chat::{ChatHistoryState, ChatSession, Message};
use chronicle_types::config::StoragePolicy;
use chronicle_types::error::StorageError;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::codec;
use crate::notify::{ChangeBus, StoreEvent};
use crate::storage::medium::StorageMedium;

/// Key holding the JSON array of persisted sessions.
pub const SESSIONS_KEY: &str = "chat-sessions";

/// Key holding the bare active session id; removed when there is none.
pub const ACTIVE_SESSION_KEY: &str = "active-session-id";

/// Pre-session flat message array. Read once for migration, then
/// maintained as a write-only mirror of the live transcript for external
/// tooling that still reads the old key.
pub const LEGACY_KEY: &str = "chat-history";

/// Backup of the legacy payload taken during migration.
pub const LEGACY_BACKUP_KEY: &str = "chat-history-backup";

/// Outcome of a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written, comfortably inside the budget.
    Clean,
    /// Written, but the optimized payload crossed the warning threshold.
    NearCapacity { estimated_bytes: usize },
}

/// Storage adapter over a shared medium.
///
/// Cheap to clone: clones share the medium, the change bus, and the
/// policy, so several stores in one process see the same namespace.
pub struct HistoryStore<M> {
    medium: Arc<M>,
    bus: Arc<ChangeBus>,
    policy: StoragePolicy,
}

impl<M> Clone for HistoryStore<M> {
    fn clone(&self) -> Self {
        Self {
            medium: Arc::clone(&self.medium),
            bus: Arc::clone(&self.bus),
            policy: self.policy.clone(),
        }
    }
}

impl<M: StorageMedium> HistoryStore<M> {
    pub fn new(medium: Arc<M>, bus: Arc<ChangeBus>, policy: StoragePolicy) -> Self {
        Self { medium, bus, policy }
    }

    pub fn policy(&self) -> &StoragePolicy {
        &self.policy
    }

    pub fn bus(&self) -> &Arc<ChangeBus> {
        &self.bus
    }

    pub(crate) fn medium(&self) -> &M {
        &self.medium
    }

    /// Whether session-format data exists in the medium.
    pub fn has_session_data(&self) -> bool {
        matches!(self.medium.get(SESSIONS_KEY), Ok(Some(_)))
    }

    /// Load the full history state.
    ///
    /// Missing data loads as the empty state. A present but
    /// non-deserializable payload is recoverable corruption: it also
    /// loads as the empty state, with a diagnostic, rather than failing
    /// the caller. An active id that references no loaded session is
    /// discarded.
    pub fn load(&self) -> ChatHistoryState {
        let mut state = ChatHistoryState::empty(self.policy.max_sessions);

        match self.medium.get(SESSIONS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ChatSession>>(&raw) {
                Ok(sessions) => state.sessions = sessions,
                Err(err) => {
                    let err = StorageError::Corrupt(err.to_string());
                    warn!("discarding persisted sessions: {err}");
                }
            },
            Ok(None) => {}
            Err(err) => warn!("failed to read persisted sessions: {err}"),
        }

        state.active_session_id = self.load_active_id(&state.sessions);
        state
    }

    fn load_active_id(&self, sessions: &[ChatSession]) -> Option<Uuid> {
        let raw = match self.medium.get(ACTIVE_SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!("failed to read active session id: {err}");
                return None;
            }
        };
        match raw.trim().parse::<Uuid>() {
            Ok(id) if sessions.iter().any(|s| s.id == id) => Some(id),
            Ok(id) => {
                warn!(%id, "active session id references no persisted session");
                None
            }
            Err(err) => {
                warn!("discarding unparsable active session id: {err}");
                None
            }
        }
    }

    /// Persist the state.
    ///
    /// Runs the codec pipeline, then enforces the hard byte budget up
    /// front: a state that cannot fit fails with `StorageFull` and
    /// nothing is written. Platform quota failures translate to
    /// `QuotaExceeded`. The active id lives under its own key so a state
    /// with zero sessions still round-trips an absent active id.
    ///
    /// Publishes on the change bus after a successful write; `origin`
    /// (a subscription id) is excluded from delivery so a writer does
    /// not reload its own write.
    pub fn save(
        &self,
        state: &ChatHistoryState,
        origin: Option<Uuid>,
    ) -> Result<SaveOutcome, StorageError> {
        let optimized = codec::optimize(&state.sessions, &self.policy);
        let estimated = codec::estimate_size(&optimized);
        if estimated > self.policy.max_total_bytes {
            return Err(StorageError::StorageFull {
                estimated_bytes: estimated,
                budget_bytes: self.policy.max_total_bytes,
            });
        }

        let payload =
            serde_json::to_string(&optimized).map_err(|e| StorageError::Serialize(e.to_string()))?;
        self.medium
            .set(SESSIONS_KEY, &payload)
            .map_err(StorageError::from)?;

        match state.active_session_id {
            Some(id) => self
                .medium
                .set(ACTIVE_SESSION_KEY, &id.to_string())
                .map_err(StorageError::from)?,
            None => self
                .medium
                .remove(ACTIVE_SESSION_KEY)
                .map_err(StorageError::from)?,
        }

        self.bus.publish_excluding(StoreEvent::HistoryWritten, origin);

        if estimated > self.policy.warn_bytes {
            warn!(
                estimated,
                budget = self.policy.max_total_bytes,
                "persisted history is near the storage budget"
            );
            return Ok(SaveOutcome::NearCapacity {
                estimated_bytes: estimated,
            });
        }
        debug!(estimated, sessions = optimized.len(), "persisted history");
        Ok(SaveOutcome::Clean)
    }

    // --- Legacy key compatibility ---

    /// Best-effort mirror of the live transcript into the legacy flat
    /// key, so external tooling reading the old key keeps observing the
    /// current conversation. Failures are logged and swallowed.
    pub fn mirror_legacy(&self, messages: &[Message]) {
        let payload = match serde_json::to_string(messages) {
            Ok(payload) => payload,
            Err(err) => {
                debug!("legacy mirror skipped: {err}");
                return;
            }
        };
        if let Err(err) = self.medium.set(LEGACY_KEY, &payload) {
            debug!("legacy mirror write failed: {err}");
        }
    }

    /// Read the legacy flat message array, if present and well-formed.
    pub fn read_legacy(&self) -> Option<Vec<Message>> {
        let raw = match self.medium.get(LEGACY_KEY) {
            Ok(Some(raw)) => raw,
            _ => return None,
        };
        match serde_json::from_str::<Vec<Message>>(&raw) {
            Ok(messages) if !messages.is_empty() => Some(messages),
            Ok(_) => None,
            Err(err) => {
                debug!("ignoring unparsable legacy history: {err}");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
