//! Navigation bar model
//!
//! Follows the auth state and exposes what the header should show.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use rewear_auth::{AuthService, AuthUser, Subscription};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NavBar {
    /// Login and sign-up buttons
    SignedOut,
    /// Browse and dashboard links, avatar and sign-out button
    SignedIn { initial: char, label: String },
}

impl NavBar {
    pub fn for_user(user: Option<&AuthUser>) -> Self {
        match user {
            None => NavBar::SignedOut,
            Some(user) => {
                let label = user.label().to_string();
                let initial = label
                    .chars()
                    .next()
                    .and_then(|c| c.to_uppercase().next())
                    .unwrap_or('?');
                NavBar::SignedIn { initial, label }
            }
        }
    }
}

pub struct Navigation {
    current: Arc<RwLock<NavBar>>,
    _subscription: Subscription,
}

impl Navigation {
    pub fn attach(auth: &dyn AuthService) -> Self {
        let current = Arc::new(RwLock::new(NavBar::SignedOut));

        let target = Arc::clone(&current);
        let subscription = auth.subscribe(Arc::new(move |user: Option<&AuthUser>| {
            let bar = NavBar::for_user(user);
            tracing::debug!(?bar, "Updating navigation");
            *target.write() = bar;
        }));

        Self {
            current,
            _subscription: subscription,
        }
    }

    pub fn current(&self) -> NavBar {
        self.current.read().clone()
    }
}
