//! Cross-tab session sync
//!
//! Other contexts announce writes to the session record through storage
//! change events. A signed-in payload is adopted as is. A removal is only
//! believed after re-reading the store: a stale sign-out that lands after
//! a fresh sign-in elsewhere must not log this context out.
//!
//! The re-read narrows the race but does not close it. A third write can
//! still land between the re-read and the redirect.

use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use rewear_storage::{Received, Storage, StorageEvent, StorageEvents};

use crate::local::SESSION_KEY;
use crate::navigator::Navigator;
use crate::state::SessionState;
use crate::user::{AuthUser, SessionRecord};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Another context signed in
    Adopt(AuthUser),
    /// Another context signed out and the store agrees
    SignOut,
    /// Nothing to do
    Keep,
}

/// Decide how to react to a session-record signal.
///
/// `signal` is the record carried by the event, `durable` the record read
/// back from storage. `durable` is only consulted when the signal carries
/// no user.
pub fn reconcile(signal: Option<&SessionRecord>, durable: Option<&SessionRecord>) -> SyncAction {
    if let Some(user) = signal.and_then(|record| record.user.as_ref()) {
        return SyncAction::Adopt(user.clone());
    }

    match durable.and_then(|record| record.user.as_ref()) {
        Some(_) => SyncAction::Keep,
        None => SyncAction::SignOut,
    }
}

pub struct CrossTabSync {
    storage: Storage,
    state: Arc<SessionState>,
    navigator: Arc<dyn Navigator>,
    events: StorageEvents,
}

impl CrossTabSync {
    /// Starts listening immediately; events written after this call are
    /// not lost even if [`run`](Self::run) starts later.
    pub fn new(storage: Storage, state: Arc<SessionState>, navigator: Arc<dyn Navigator>) -> Self {
        let events = storage.events();
        Self::with_events(storage, state, navigator, events)
    }

    pub fn with_events(
        storage: Storage,
        state: Arc<SessionState>,
        navigator: Arc<dyn Navigator>,
        events: StorageEvents,
    ) -> Self {
        Self {
            storage,
            state,
            navigator,
            events,
        }
    }

    /// Process events until `shutdown` fires or its sender is dropped.
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                received = self.events.recv() => {
                    let Some(received) = received else {
                        tracing::debug!("Storage event stream closed");
                        break;
                    };
                    if let Err(e) = self.handle(received) {
                        tracing::warn!(error = %e, "Failed to reconcile session from storage event");
                    }
                }
                _ = &mut shutdown => {
                    tracing::debug!("Cross-tab sync received shutdown signal");
                    break;
                }
            }
        }
    }

    /// Run on the current runtime. The task stops when the returned handle
    /// is stopped or dropped.
    pub fn spawn(self) -> SyncHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        SyncHandle {
            shutdown: Some(shutdown_tx),
            task: tokio::spawn(self.run(shutdown_rx)),
        }
    }

    /// Handle every event already delivered, without waiting.
    pub fn drain(&mut self) -> Result<Vec<SyncAction>> {
        let mut actions = Vec::new();
        while let Some(received) = self.events.try_recv() {
            actions.push(self.handle(received)?);
        }
        Ok(actions)
    }

    pub fn handle(&self, received: Received) -> Result<SyncAction> {
        let action = match received {
            Received::Change(event) if event.key == SESSION_KEY => self.on_session_event(&event)?,
            Received::Change(_) => return Ok(SyncAction::Keep),
            Received::Lagged(_) => self.resync()?,
        };

        self.apply(&action);
        Ok(action)
    }

    fn on_session_event(&self, event: &StorageEvent) -> Result<SyncAction> {
        let signal = event.new_value.as_deref().and_then(SessionRecord::decode);
        let signals_user = signal.as_ref().is_some_and(|record| record.user.is_some());

        let durable = if signals_user {
            None
        } else {
            SessionRecord::load(&self.storage)?
        };

        Ok(reconcile(signal.as_ref(), durable.as_ref()))
    }

    /// Missed events: fall back to whatever the store holds now.
    fn resync(&self) -> Result<SyncAction> {
        let durable = SessionRecord::load(&self.storage)?;
        let current = self.state.current_user();

        Ok(match durable.and_then(|record| record.user) {
            Some(user) if current.as_ref() == Some(&user) => SyncAction::Keep,
            Some(user) => SyncAction::Adopt(user),
            None if current.is_some() => SyncAction::SignOut,
            None => SyncAction::Keep,
        })
    }

    fn apply(&self, action: &SyncAction) {
        match action {
            SyncAction::Adopt(user) => {
                tracing::info!(email = %user.email, "User signed in from another tab");
                self.state.transition(Some(user.clone()));
            }
            SyncAction::SignOut => {
                tracing::info!("User signed out from another tab");
                self.state.transition(None);

                if self.navigator.current_view().requires_auth() {
                    self.navigator.redirect_to_landing();
                }
            }
            SyncAction::Keep => {}
        }
    }
}

/// Owns a spawned [`CrossTabSync`] task.
pub struct SyncHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Signal the task and wait for it to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(error = %e, "Cross-tab sync task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
