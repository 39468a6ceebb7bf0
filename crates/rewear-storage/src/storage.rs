//! Per-context key-value storage
//!
//! A `Storage` is one execution context's handle on the shared database,
//! the equivalent of a browser tab's `localStorage`.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::database::Database;
use crate::error::StorageError;
use crate::events::{Change, StorageEvent, StorageEvents};
use crate::Result;

pub struct Storage {
    db: Database,
    /// Identifies this context's writes in the change stream
    origin: Uuid,
}

impl Storage {
    pub(crate) fn new(db: Database) -> Self {
        Self {
            db,
            origin: Uuid::new_v4(),
        }
    }

    pub fn origin(&self) -> Uuid {
        self.origin
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.db.lock();
        read_item(&conn, key)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.db.lock();
        let old = read_item(&conn, key)?;
        self.apply(&conn, key, old, Some(value))
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        let conn = self.db.lock();
        let old = read_item(&conn, key)?;
        self.apply(&conn, key, old, None)
    }

    /// Atomic read-modify-write of a single key.
    ///
    /// `f` receives the current value and returns the value to store
    /// (`None` removes the key). An error from `f` aborts without writing.
    pub fn update_item<F, E>(&self, key: &str, f: F) -> std::result::Result<Option<String>, E>
    where
        F: FnOnce(Option<&str>) -> std::result::Result<Option<String>, E>,
        E: From<StorageError>,
    {
        let conn = self.db.lock();
        let old = read_item(&conn, key)?;
        let new = f(old.as_deref())?;
        self.apply(&conn, key, old, new.as_deref())?;
        Ok(new)
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT key FROM items ORDER BY key")?;
            let keys = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(keys)
        })
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_item(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_item(key, &raw)
    }

    /// Subscribe to changes made by other contexts.
    pub fn events(&self) -> StorageEvents {
        StorageEvents::new(self.origin, self.db.subscribe())
    }

    /// Write `new` over `old` and publish the change. Writes that leave
    /// the stored value as it was are not published.
    fn apply(
        &self,
        conn: &Connection,
        key: &str,
        old: Option<String>,
        new: Option<&str>,
    ) -> Result<()> {
        if old.as_deref() == new {
            return Ok(());
        }

        match new {
            Some(value) => {
                conn.execute(
                    "INSERT OR REPLACE INTO items (key, value, updated_at) VALUES (?1, ?2, ?3)",
                    rusqlite::params![key, value, Utc::now().to_rfc3339()],
                )?;
            }
            None => {
                conn.execute("DELETE FROM items WHERE key = ?1", [key])?;
            }
        }

        self.db.publish(Change {
            origin: self.origin,
            event: StorageEvent {
                key: key.to_string(),
                old_value: old,
                new_value: new.map(str::to_string),
            },
        });

        Ok(())
    }
}

impl Clone for Storage {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            origin: self.origin,
        }
    }
}

fn read_item(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM items WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}
