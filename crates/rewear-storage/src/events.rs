//! Cross-context change events
//!
//! Mirrors the browser `storage` event: a write in one context is delivered
//! to every other context as `{key, old_value, new_value}`.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// Value before the write, `None` if the key was absent
    pub old_value: Option<String>,
    /// Value after the write, `None` if the key was removed
    pub new_value: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Change {
    pub origin: Uuid,
    pub event: StorageEvent,
}

/// What a context receives from its event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Change(StorageEvent),
    /// The receiver fell behind and this many events were dropped
    Lagged(u64),
}

/// Inbound change events for one context, excluding its own writes.
pub struct StorageEvents {
    origin: Uuid,
    rx: broadcast::Receiver<Change>,
}

impl StorageEvents {
    pub(crate) fn new(origin: Uuid, rx: broadcast::Receiver<Change>) -> Self {
        Self { origin, rx }
    }

    /// Wait for the next foreign change. Returns `None` once the
    /// `Database` and every `Storage` context cloned from it are dropped.
    /// A receiver whose owner also holds a `Storage` never sees `None`, so
    /// long-running consumers need their own stop signal.
    pub async fn recv(&mut self) -> Option<Received> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.origin == self.origin => continue,
                Ok(change) => return Some(Received::Change(change.event)),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Storage event receiver lagged");
                    return Some(Received::Lagged(missed));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv). Returns `None` when
    /// nothing is pending.
    pub fn try_recv(&mut self) -> Option<Received> {
        loop {
            match self.rx.try_recv() {
                Ok(change) if change.origin == self.origin => continue,
                Ok(change) => return Some(Received::Change(change.event)),
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Storage event receiver lagged");
                    return Some(Received::Lagged(missed));
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}
