//! ReWear Core
//!
//! Coordination layer for one browser tab: wires the auth service, cross-tab
//! sync, session restoration, profile documents and the navigation model
//! over a shared storage database.

mod config;
mod context;
mod error;
mod location;
mod navigation;
mod profile;

pub use config::Config;
pub use context::Context;
pub use error::CoreError;
pub use location::Location;
pub use navigation::{NavBar, Navigation};
pub use profile::{ProfileSync, UserProfile, USERS_COLLECTION};

// Re-export the lower layers
pub use rewear_auth::{
    message_for_code as error_message, AuthConfig, AuthError, AuthService, AuthUser,
    LocalAuth, ProfileUpdate, SyncAction, View,
};
pub use rewear_storage::{Database, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
