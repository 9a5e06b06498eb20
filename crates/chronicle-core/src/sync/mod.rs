//! Conversation sync engine.
//!
//! Bridges the locally mutable message buffer (the conversation being
//! composed) with the active session's canonical transcript. A
//! tri-state origin marker keeps the two copies from feeding back into
//! each other: local edits flow into the session exactly once, and
//! session-sourced refreshes never echo back as writes.
//!
//! The host is expected to call [`ConversationView::sync_from_store`]
//! after every session switch and after applying an external update, so
//! the buffer always mirrors the session it claims to show.

use chronicle_types::chat::Message;
use tracing::debug;
use uuid::Uuid;

use crate::storage::medium::StorageMedium;
use crate::store::SessionStore;
use crate::store::snapshot::messages_equal;

/// Which side produced the most recent buffer update.
///
/// Read and cleared within a single reconciliation step; never inferred
/// from timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateOrigin {
    /// No pending update.
    #[default]
    None,
    /// The UI mutated the buffer; reconciliation must persist it.
    Local,
    /// The buffer was overwritten from the active session; persisting
    /// it back would only echo.
    Session,
}

/// Locally buffered view of the active conversation.
#[derive(Debug, Default)]
pub struct ConversationView {
    buffer: Vec<Message>,
    origin: UpdateOrigin,
    synced_session: Option<Uuid>,
}

impl ConversationView {
    pub fn new() -> Self {
        Self::default()
    }

    /// The buffered transcript.
    pub fn messages(&self) -> &[Message] {
        &self.buffer
    }

    /// Current origin marker (mostly useful for diagnostics).
    pub fn origin(&self) -> UpdateOrigin {
        self.origin
    }

    /// Append a message produced by the UI, then reconcile.
    ///
    /// Assigns an id when the message has none, so buffer and session
    /// copies stay structurally identical after the write.
    pub fn append<M: StorageMedium>(&mut self, store: &mut SessionStore<M>, mut message: Message) {
        if message.id.is_none() {
            message.id = Some(Uuid::now_v7());
        }
        self.buffer.push(message);
        self.origin = UpdateOrigin::Local;
        store.adapter().mirror_legacy(&self.buffer);
        self.reconcile(store);
    }

    /// Replace the whole buffer from the UI, then reconcile.
    pub fn replace<M: StorageMedium>(
        &mut self,
        store: &mut SessionStore<M>,
        messages: Vec<Message>,
    ) {
        self.buffer = messages;
        self.origin = UpdateOrigin::Local;
        store.adapter().mirror_legacy(&self.buffer);
        self.reconcile(store);
    }

    /// Re-derive the buffer from the store after a session switch,
    /// initial load, or externally applied update.
    ///
    /// Overwrites the buffer from the active session when the session
    /// changed or its content diverged; a pending local edit wins over
    /// an external refresh of the same session.
    pub fn sync_from_store<M: StorageMedium>(&mut self, store: &SessionStore<M>) {
        match store.active_session() {
            Some(session) => {
                let switched = self.synced_session != Some(session.id);
                let differs = !messages_equal(&self.buffer, &session.messages);
                if (switched || self.origin != UpdateOrigin::Local) && differs {
                    debug!(session = %session.id, "buffer overwritten from session");
                    self.buffer = session.messages.clone();
                    self.origin = UpdateOrigin::Session;
                    store.adapter().mirror_legacy(&self.buffer);
                }
                self.synced_session = Some(session.id);
            }
            None => {
                self.synced_session = None;
                // Seed from the legacy key only while no session exists
                // at all: a freshly loaded session must never be stomped
                // by stale legacy data.
                if self.buffer.is_empty() && store.sessions().is_empty() {
                    if let Some(messages) = store.adapter().read_legacy() {
                        debug!(count = messages.len(), "buffer seeded from legacy history");
                        self.buffer = messages;
                        self.origin = UpdateOrigin::Session;
                    }
                }
            }
        }
    }

    /// Decide whether the buffer should be written into the canonical
    /// store. Reads and clears the origin marker in one step.
    ///
    /// Persists only when the marker is `Local` and the buffer differs
    /// structurally from the active session's messages; creates a
    /// session first when none is active. A `Session` marker makes this
    /// a no-op, which is what breaks the feedback loop.
    pub fn reconcile<M: StorageMedium>(&mut self, store: &mut SessionStore<M>) {
        let origin = std::mem::take(&mut self.origin);
        if origin != UpdateOrigin::Local {
            return;
        }

        let target = match store.active_session_id() {
            Some(id) => id,
            None => {
                if self.buffer.is_empty() {
                    return;
                }
                let id = store.create_new_chat();
                self.synced_session = Some(id);
                id
            }
        };

        let differs = store
            .active_session()
            .map(|s| !messages_equal(&self.buffer, &s.messages))
            .unwrap_or(true);
        if differs {
            store.update_session_messages(target, self.buffer.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
