//! ReWear Authentication
//!
//! A local stand-in for a hosted auth service:
//! - Accounts and the active session live in shared key-value storage
//! - Subscribers are notified on every session transition, in registration order
//! - Contexts sharing the storage converge on the persisted session record
//! - Guarded views restore a fresh session or time out to the landing page

mod config;
mod error;
mod local;
mod navigator;
mod observers;
mod restore;
mod service;
mod state;
mod sync;
mod user;

pub use config::AuthConfig;
pub use error::{message_for_code, AuthError};
pub use local::{LocalAuth, ACCOUNTS_KEY, SESSION_KEY};
pub use navigator::{Navigator, View};
pub use observers::{Observer, Observers, Subscription};
pub use restore::SessionRestorer;
pub use service::{AuthService, ProfileUpdate};
pub use state::SessionState;
pub use sync::{reconcile, CrossTabSync, SyncAction, SyncHandle};
pub use user::{Account, Accounts, AuthUser, SessionRecord};

pub type Result<T> = std::result::Result<T, AuthError>;
