//! In-memory session mirror for one execution context

use parking_lot::{ReentrantMutex, RwLock};
use std::sync::Arc;

use crate::observers::{Observer, Observers, Subscription};
use crate::user::AuthUser;

/// The context's view of who is signed in, plus the subscribers that
/// follow it. Owned by the auth service and shared with sync and restore.
///
/// Transitions are serialized: subscribers see them in the order they were
/// applied, and the last notification always matches `current_user`.
#[derive(Default)]
pub struct SessionState {
    current: RwLock<Option<AuthUser>>,
    observers: Observers,
    /// Held across set-and-notify. Reentrant so observers may transition.
    transitions: ReentrantMutex<()>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.current.read().clone()
    }

    /// Register `observer` and call it once with the current user.
    pub fn subscribe(&self, observer: Observer) -> Subscription {
        let _guard = self.transitions.lock();
        let subscription = self.observers.register(Arc::clone(&observer));
        let current = self.current_user();
        observer(current.as_ref());
        subscription
    }

    /// Set the current user and notify every subscriber.
    pub fn transition(&self, user: Option<AuthUser>) {
        let _guard = self.transitions.lock();
        *self.current.write() = user.clone();
        self.observers.notify(user.as_ref());
    }

    /// Set the current user without notifying.
    pub(crate) fn replace(&self, user: Option<AuthUser>) {
        let _guard = self.transitions.lock();
        *self.current.write() = user;
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }
}
