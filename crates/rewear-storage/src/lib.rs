//! ReWear Storage Layer
//!
//! SQLite-backed key-value storage shared by every execution context.
//! Writes from one context are delivered to all other contexts as change events.

mod database;
mod documents;
mod error;
mod events;
mod migrations;
mod storage;

pub use database::Database;
pub use documents::{DocumentSnapshot, DocumentStore};
pub use error::StorageError;
pub use events::{Received, StorageEvent, StorageEvents};
pub use storage::Storage;

pub type Result<T> = std::result::Result<T, StorageError>;
