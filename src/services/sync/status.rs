use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// How many undelivered messages an observer may queue before it is considered dead.
pub const OBSERVER_BUFFER: usize = 16;

/// Message pushed to observers on every transition of the global syncing flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub syncing: bool,
}

/// Opaque identifier of one observer connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    #[error("observer connection is closed")]
    Closed,
    #[error("observer is not draining its messages")]
    Lagging,
}

/// Something that can receive status messages. Sending must not block.
pub trait StatusObserver: Send + Sync {
    fn send(&self, message: StatusMessage) -> Result<(), ObserverError>;
}

impl StatusObserver for mpsc::Sender<StatusMessage> {
    fn send(&self, message: StatusMessage) -> Result<(), ObserverError> {
        self.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => ObserverError::Lagging,
            TrySendError::Closed(_) => ObserverError::Closed,
        })
    }
}

/// Registry of connected observers.
///
/// Created once at server start and shared by the sync runs (publishing) and the connection
/// handler (registering). An observer that fails to accept a message is dropped from the registry.
pub struct StatusBroadcaster {
    observers: Mutex<HashMap<ConnectionId, Arc<dyn StatusObserver>>>,
    next_id: AtomicU64,
}

impl StatusBroadcaster {
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    fn observers(&self) -> MutexGuard<'_, HashMap<ConnectionId, Arc<dyn StatusObserver>>> {
        // The map is never left half-updated, so a poisoned lock is still usable
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers an observer under a fresh id derived from `label` (e.g. the peer address).
    pub fn register(&self, label: &str, observer: Arc<dyn StatusObserver>) -> ConnectionId {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = ConnectionId(format!("{label}-{n}"));
        self.observers().insert(id.clone(), observer);
        tracing::debug!(connection = %id, "Registered status observer");
        id
    }

    /// Registers a channel-backed observer and returns the receiving end.
    pub fn subscribe(&self, label: &str) -> (ConnectionId, mpsc::Receiver<StatusMessage>) {
        let (tx, rx) = mpsc::channel(OBSERVER_BUFFER);
        let id = self.register(label, Arc::new(tx));
        (id, rx)
    }

    pub fn deregister(&self, id: &ConnectionId) -> bool {
        let removed = self.observers().remove(id).is_some();
        if removed {
            tracing::debug!(connection = %id, "Deregistered status observer");
        }
        removed
    }

    pub fn observer_count(&self) -> usize {
        self.observers().len()
    }

    /// Sends `message` to every observer. Failing observers are deregistered; the caller never
    /// sees their errors.
    pub fn publish(&self, message: StatusMessage) {
        // Deliver outside the lock so registration is never blocked by a publish
        let snapshot: Vec<(ConnectionId, Arc<dyn StatusObserver>)> = self
            .observers()
            .iter()
            .map(|(id, observer)| (id.clone(), observer.clone()))
            .collect();
        tracing::debug!(
            syncing = message.syncing,
            observers = snapshot.len(),
            "Publishing sync status"
        );

        let failed: Vec<ConnectionId> = snapshot
            .into_iter()
            .filter_map(|(id, observer)| match observer.send(message) {
                Ok(()) => None,
                Err(e) => {
                    tracing::debug!(connection = %id, "Dropping status observer: {}", e);
                    Some(id)
                }
            })
            .collect();

        if !failed.is_empty() {
            let mut observers = self.observers();
            for id in &failed {
                observers.remove(id);
            }
        }
    }

    /// Drops every observer, closing their channels.
    pub fn shutdown(&self) {
        let mut observers = self.observers();
        tracing::info!("Closing {} status observers", observers.len());
        observers.clear();
    }
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
