//! Ordered observer list for session transitions

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

use crate::user::AuthUser;

/// Callback invoked with the current user, `None` when signed out.
pub type Observer = Arc<dyn Fn(Option<&AuthUser>) + Send + Sync>;

#[derive(Default)]
struct ObserverList {
    next_id: u64,
    entries: Vec<(u64, Observer)>,
}

#[derive(Clone, Default)]
pub struct Observers {
    inner: Arc<Mutex<ObserverList>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer. It stays registered until the returned
    /// subscription is dropped.
    pub fn register(&self, observer: Observer) -> Subscription {
        let mut list = self.inner.lock();
        let id = list.next_id;
        list.next_id += 1;
        list.entries.push((id, observer));

        Subscription {
            id,
            list: Arc::downgrade(&self.inner),
        }
    }

    /// Call every observer in registration order.
    ///
    /// The list is snapshotted first, so observers may subscribe or
    /// unsubscribe from inside their callback.
    pub fn notify(&self, user: Option<&AuthUser>) {
        let snapshot: Vec<Observer> = self
            .inner
            .lock()
            .entries
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in snapshot {
            observer(user);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Deregistration handle returned by `subscribe`.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    list: Weak<Mutex<ObserverList>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(list) = self.list.upgrade() {
            list.lock().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> Observer {
        let log = Arc::clone(log);
        Arc::new(move |user: Option<&AuthUser>| {
            let who = user.map(|u| u.email.as_str()).unwrap_or("-");
            log.lock().push(format!("{}:{}", name, who));
        })
    }

    #[test]
    fn test_notify_in_registration_order() {
        let observers = Observers::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let _a = observers.register(recorder(&log, "A"));
        let _b = observers.register(recorder(&log, "B"));
        let _c = observers.register(recorder(&log, "C"));

        observers.notify(None);
        assert_eq!(*log.lock(), vec!["A:-", "B:-", "C:-"]);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let observers = Observers::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let a = observers.register(recorder(&log, "A"));
        let _b = observers.register(recorder(&log, "B"));
        assert_eq!(observers.len(), 2);

        a.unsubscribe();
        observers.notify(None);

        assert_eq!(*log.lock(), vec!["B:-"]);
        assert_eq!(observers.len(), 1);
    }

    #[test]
    fn test_unsubscribe_from_inside_callback() {
        let observers = Observers::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let inner_slot = Arc::clone(&slot);
        let subscription = observers.register(Arc::new(move |_: Option<&AuthUser>| {
            inner_slot.lock().take();
        }));
        *slot.lock() = Some(subscription);

        observers.notify(None);
        assert!(observers.is_empty());
    }
}
