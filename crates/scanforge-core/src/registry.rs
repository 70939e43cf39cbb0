//! Observer registry
//!
//! Tracks, per session id, the live connections interested in that session's
//! event stream, and fans broadcast events out to them. The registry owns
//! only membership; the transport owns each connection's lifecycle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::events::ScanEvent;

/// Handle to one connected observer.
///
/// Serialized events are pushed into `tx`; the transport drains the paired
/// receiver into the socket, which keeps per-observer delivery in order.
#[derive(Debug, Clone)]
pub struct ObserverHandle {
    /// Identifies the connection within a session's observer set
    pub connection_id: Uuid,
    /// Sending side of the observer's event queue
    pub tx: mpsc::UnboundedSender<String>,
}

impl ObserverHandle {
    /// Create a handle and the receiving end the transport should drain
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                connection_id: Uuid::new_v4(),
                tx,
            },
            rx,
        )
    }
}

/// Registry of observers keyed by session id
#[derive(Debug, Default)]
pub struct ObserverRegistry {
    observers: RwLock<HashMap<Uuid, Vec<ObserverHandle>>>,
    dropped_events: AtomicU64,
}

impl ObserverRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer under the session's set, creating it if absent
    pub async fn join(&self, session_id: Uuid, handle: ObserverHandle) {
        let connection_id = handle.connection_id;
        let mut observers = self.observers.write().await;
        observers.entry(session_id).or_default().push(handle);
        debug!(%session_id, %connection_id, "observer joined");
    }

    /// Remove an observer; removing a non-member is a no-op
    pub async fn leave(&self, session_id: Uuid, connection_id: Uuid) {
        let mut observers = self.observers.write().await;
        if let Some(handles) = observers.get_mut(&session_id) {
            handles.retain(|h| h.connection_id != connection_id);
            if handles.is_empty() {
                observers.remove(&session_id);
            }
        }
        debug!(%session_id, %connection_id, "observer left");
    }

    /// Deliver an event to every observer of the session, in join order.
    ///
    /// Delivery to a closed connection is dropped and counted; it never
    /// fails the broadcast or skips the remaining observers.
    pub async fn broadcast(&self, session_id: Uuid, event: &ScanEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%session_id, error = %e, "failed to serialize scan event");
                return;
            }
        };

        let observers = self.observers.read().await;
        if let Some(handles) = observers.get(&session_id) {
            for handle in handles {
                if handle.tx.send(payload.clone()).is_err() {
                    self.dropped_events.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Number of observers currently attached to a session
    pub async fn observer_count(&self, session_id: Uuid) -> usize {
        let observers = self.observers.read().await;
        observers.get(&session_id).map_or(0, Vec::len)
    }

    /// Events that could not be delivered since startup
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }
}
