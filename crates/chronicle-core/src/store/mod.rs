//! Session store: canonical CRUD over sessions with guarded persistence.
//!
//! One store instance owns an in-memory copy of the history state. Every
//! meaningful change is persisted through the storage adapter behind a
//! snapshot comparison, so unchanged state never produces a second
//! write. Stores sharing a namespace converge through the change bus:
//! each subscribes at construction and reloads when a sibling writes.

pub mod snapshot;

use chrono::Utc;
use chronicle_types::chat::{ChatHistoryState, ChatSession, Message, MessageRole};
use chronicle_types::error::StoreError;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::notify::{ChangeBus, Subscription};
use crate::storage::adapter::{HistoryStore, SaveOutcome};
use crate::storage::legacy;
use crate::storage::medium::StorageMedium;

use self::snapshot::StateSnapshot;

/// Title given to sessions before the first user message names them.
pub const DEFAULT_SESSION_TITLE: &str = "New conversation";

/// Maximum derived-title length before truncation.
const TITLE_MAX_CHARS: usize = 40;

/// Load lifecycle of a store instance.
///
/// Mutating operations are only meaningful in `Ready`; writes are
/// skipped in the earlier phases so an empty in-memory state can never
/// clobber a populated store before the initial load finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Uninitialized,
    Loading,
    Ready,
}

/// Canonical session list plus active-id tracking for one consumer.
pub struct SessionStore<M: StorageMedium> {
    adapter: HistoryStore<M>,
    state: ChatHistoryState,
    phase: LoadPhase,
    last_saved: Option<StateSnapshot>,
    last_error: Option<StoreError>,
    subscription: Subscription,
}

impl<M: StorageMedium> SessionStore<M> {
    /// Create an uninitialized store; call [`init`](Self::init) before
    /// use. Subscribes to the adapter's change bus immediately so writes
    /// from sibling instances are never missed.
    pub fn new(adapter: HistoryStore<M>) -> Self {
        let subscription = ChangeBus::subscribe(adapter.bus());
        let max_sessions = adapter.policy().max_sessions;
        Self {
            adapter,
            state: ChatHistoryState::empty(max_sessions),
            phase: LoadPhase::Uninitialized,
            last_saved: None,
            last_error: None,
            subscription,
        }
    }

    /// Load persisted state, migrating the legacy flat format when no
    /// session-format data exists yet.
    pub fn init(&mut self) {
        self.phase = LoadPhase::Loading;

        let mut migrated = false;
        if self.adapter.has_session_data() {
            self.state = self.adapter.load();
        } else if let Some(session) = legacy::migrate_legacy(self.adapter.medium()) {
            self.state = ChatHistoryState::empty(self.adapter.policy().max_sessions);
            self.state.active_session_id = Some(session.id);
            self.state.sessions = vec![session];
            migrated = true;
        } else {
            // Nothing persisted: the empty loaded state replaces any
            // mutation that slipped in before init.
            self.state = self.adapter.load();
        }

        self.phase = LoadPhase::Ready;
        if migrated {
            self.persist();
        } else {
            self.last_saved = Some(self.snapshot());
        }
    }

    // --- Read surface ---

    pub fn sessions(&self) -> &[ChatSession] {
        &self.state.sessions
    }

    pub fn active_session_id(&self) -> Option<Uuid> {
        self.state.active_session_id
    }

    pub fn active_session(&self) -> Option<&ChatSession> {
        self.state.active_session()
    }

    /// True until the initial load has completed.
    pub fn is_loading(&self) -> bool {
        self.phase != LoadPhase::Ready
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// Last non-fatal failure, if any. Storage and lookup errors land
    /// here instead of propagating; the store stays usable.
    pub fn error(&self) -> Option<&StoreError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub(crate) fn adapter(&self) -> &HistoryStore<M> {
        &self.adapter
    }

    // --- Mutations ---

    /// Create an empty session, make it active, and return its id.
    pub fn create_new_chat(&mut self) -> Uuid {
        let session = ChatSession::new(DEFAULT_SESSION_TITLE);
        let id = session.id;
        self.state.sessions.insert(0, session);
        self.state.active_session_id = Some(id);
        self.refresh_active_flags();
        self.persist();
        id
    }

    /// Make an existing session active.
    ///
    /// Unknown ids leave the state unchanged and record a
    /// `SessionNotFound` error.
    pub fn switch_to_chat(&mut self, session_id: Uuid) -> bool {
        if self.state.session(session_id).is_none() {
            self.last_error = Some(StoreError::SessionNotFound(session_id));
            return false;
        }
        self.state.active_session_id = Some(session_id);
        self.refresh_active_flags();
        self.persist();
        true
    }

    /// Delete a session. Deleting the active session clears the active
    /// id; no replacement is auto-selected (that is a UI decision).
    pub fn delete_chat(&mut self, session_id: Uuid) -> bool {
        let before = self.state.sessions.len();
        self.state.sessions.retain(|s| s.id != session_id);
        if self.state.sessions.len() == before {
            self.last_error = Some(StoreError::SessionNotFound(session_id));
            return false;
        }
        if self.state.active_session_id == Some(session_id) {
            self.state.active_session_id = None;
        }
        self.refresh_active_flags();
        self.persist();
        true
    }

    /// Replace a session's title.
    pub fn update_chat_title(&mut self, session_id: Uuid, title: impl Into<String>) -> bool {
        let Some(session) = self.state.session_mut(session_id) else {
            self.last_error = Some(StoreError::SessionNotFound(session_id));
            return false;
        };
        session.title = title.into();
        session.updated_at = Utc::now();
        self.persist();
        true
    }

    /// Replace a session's transcript wholesale.
    pub fn update_session_messages(&mut self, session_id: Uuid, messages: Vec<Message>) -> bool {
        let Some(session) = self.state.session_mut(session_id) else {
            self.last_error = Some(StoreError::SessionNotFound(session_id));
            return false;
        };
        session.messages = messages;
        session.updated_at = Utc::now();
        derive_title(session);
        self.persist();
        true
    }

    /// Append one message, assigning an id when absent.
    pub fn add_message_to_chat(&mut self, session_id: Uuid, mut message: Message) -> bool {
        let Some(session) = self.state.session_mut(session_id) else {
            self.last_error = Some(StoreError::SessionNotFound(session_id));
            return false;
        };
        if message.id.is_none() {
            message.id = Some(Uuid::now_v7());
        }
        session.messages.push(message);
        session.updated_at = Utc::now();
        derive_title(session);
        self.persist();
        true
    }

    // --- Convergence ---

    /// Drain pending change notifications and reload when another
    /// instance has written a different state.
    ///
    /// Returns true when the in-memory state was replaced.
    pub fn poll_external(&mut self) -> bool {
        if self.subscription.drain().is_empty() {
            return false;
        }
        self.reload_if_changed()
    }

    fn reload_if_changed(&mut self) -> bool {
        let loaded = self.adapter.load();
        let loaded_snap = StateSnapshot::capture(&loaded.sessions, loaded.active_session_id);
        if loaded_snap == self.snapshot() {
            return false;
        }
        debug!("applying externally written history");
        self.state = loaded;
        self.last_saved = Some(loaded_snap);
        true
    }

    // --- Persistence ---

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::capture(&self.state.sessions, self.state.active_session_id)
    }

    /// Persist the current state unless nothing changed since the last
    /// successful save. Writes are skipped entirely before `init`
    /// completes.
    fn persist(&mut self) {
        if self.phase != LoadPhase::Ready {
            debug!("skipping persist before initial load");
            return;
        }
        let snap = self.snapshot();
        if self.last_saved.as_ref() == Some(&snap) {
            debug!("skipping persist: state unchanged since last save");
            return;
        }
        match self.adapter.save(&self.state, Some(self.subscription.id())) {
            Ok(outcome) => {
                if let SaveOutcome::NearCapacity { estimated_bytes } = outcome {
                    warn!(estimated_bytes, "history approaching the storage budget");
                }
                self.last_saved = Some(snap);
            }
            Err(err) => {
                warn!("failed to persist history: {err}");
                self.last_error = Some(err.into());
            }
        }
    }

    /// Keep the advisory per-session flag aligned with the active id.
    /// Deliberately does not touch `updated_at`: flag churn must not
    /// disturb eviction order.
    fn refresh_active_flags(&mut self) {
        let active = self.state.active_session_id;
        for session in &mut self.state.sessions {
            session.is_active = Some(session.id) == active;
        }
    }
}

/// Name a still-default session after its first user message.
fn derive_title(session: &mut ChatSession) {
    if session.title != DEFAULT_SESSION_TITLE {
        return;
    }
    let Some(first_user) = session
        .messages
        .iter()
        .find(|m| m.role == MessageRole::User)
    else {
        return;
    };
    let trimmed = first_user.content.trim();
    if trimmed.is_empty() {
        return;
    }
    session.title = if trimmed.chars().count() > TITLE_MAX_CHARS {
        let head: String = trimmed.chars().take(TITLE_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        trimmed.to_string()
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
