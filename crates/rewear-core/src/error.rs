//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] rewear_storage::StorageError),

    #[error("Auth error: {0}")]
    Auth(#[from] rewear_auth::AuthError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Message suitable for showing next to a form.
    pub fn user_message(&self) -> &'static str {
        match self {
            CoreError::Auth(e) => e.user_message(),
            _ => rewear_auth::message_for_code(""),
        }
    }
}
