//! Change-notification bus for cross-instance convergence.
//!
//! Several session stores can exist in one process and share a single
//! persistence namespace. The storage adapter publishes a [`StoreEvent`]
//! after every successful write; each store subscribes at construction
//! and drains its subscription to learn that it should reload. This is an
//! explicit pub/sub registry injected into its consumers, not an ambient
//! event bus. The writer itself is excluded from delivery, matching how
//! a storage-change signal only reaches the instances that did not write.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

/// Events published on the change bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// The persisted history was rewritten by some store instance.
    HistoryWritten,
}

/// Pub/sub registry of history-change subscribers.
#[derive(Debug, Default)]
pub struct ChangeBus {
    subscribers: DashMap<Uuid, Sender<StoreEvent>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber on the shared bus.
    ///
    /// Dropping the returned [`Subscription`] unsubscribes it.
    pub fn subscribe(bus: &Arc<ChangeBus>) -> Subscription {
        let id = Uuid::now_v7();
        let (tx, rx) = mpsc::channel();
        bus.subscribers.insert(id, tx);
        debug!(%id, "subscribed to change bus");
        Subscription {
            id,
            receiver: rx,
            bus: Arc::clone(bus),
        }
    }

    /// Deliver `event` to every live subscriber except `origin`.
    ///
    /// Disconnected subscribers are dropped from the registry. Returns the
    /// number of deliveries.
    pub fn publish_excluding(&self, event: StoreEvent, origin: Option<Uuid>) -> usize {
        let mut delivered = 0;
        self.subscribers.retain(|id, tx| {
            if Some(*id) == origin {
                return true;
            }
            match tx.send(event) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        delivered
    }

    /// Deliver `event` to every live subscriber.
    pub fn publish(&self, event: StoreEvent) -> usize {
        self.publish_excluding(event, None)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn unsubscribe(&self, id: &Uuid) {
        if self.subscribers.remove(id).is_some() {
            debug!(%id, "unsubscribed from change bus");
        }
    }
}

/// A live subscription to the change bus.
pub struct Subscription {
    id: Uuid,
    receiver: Receiver<StoreEvent>,
    bus: Arc<ChangeBus>,
}

impl Subscription {
    /// The subscriber id, usable as a publish origin.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Drain all pending events without blocking.
    pub fn drain(&self) -> Vec<StoreEvent> {
        self.receiver.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.id);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
