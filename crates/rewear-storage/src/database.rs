//! Database connection and change fan-out

use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::events::Change;
use crate::migrations::run_migrations;
use crate::storage::Storage;
use crate::Result;

/// Capacity of the change channel shared by all contexts.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
    /// Every committed change is published here, tagged with its writer
    changes: broadcast::Sender<Change>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for better concurrent performance
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Self {
            conn: Arc::new(Mutex::new(conn)),
            changes,
        }
    }

    /// Open a new execution context over this database.
    ///
    /// Each context gets its own origin id, so it never observes
    /// change events for its own writes.
    pub fn context(&self) -> Storage {
        Storage::new(self.clone())
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    pub(crate) fn publish(&self, change: Change) {
        match self.changes.send(change) {
            Ok(count) => tracing::trace!(receivers = count, "Published storage change"),
            Err(_) => tracing::trace!("No receivers for storage change"),
        }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            changes: self.changes.clone(),
        }
    }
}
