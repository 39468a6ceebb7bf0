//! Auth service interface
//!
//! UI collaborators depend on this trait only, so the local implementation
//! can be swapped for a hosted backend without touching callers.

use async_trait::async_trait;

use crate::observers::{Observer, Subscription};
use crate::user::AuthUser;
use crate::Result;

/// Profile fields that may be changed after sign-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
}

impl ProfileUpdate {
    pub fn display_name(name: impl Into<String>) -> Self {
        Self {
            display_name: Some(name.into()),
        }
    }
}

#[async_trait]
pub trait AuthService: Send + Sync {
    fn current_user(&self) -> Option<AuthUser>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    async fn sign_out(&self) -> Result<()>;

    async fn update_profile(&self, update: ProfileUpdate) -> Result<()>;

    /// Follow session transitions. The observer is called immediately
    /// with the current user.
    fn subscribe(&self, observer: Observer) -> Subscription;
}
