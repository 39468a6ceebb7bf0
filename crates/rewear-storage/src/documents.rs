//! Document store over key-value storage
//!
//! Documents are JSON values addressed by `(collection, id)`, one storage
//! key per document.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::storage::Storage;
use crate::Result;

/// Result of reading a document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub id: String,
    data: Option<Value>,
}

impl DocumentSnapshot {
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<Value> {
        self.data
    }

    /// Deserialize the document body into `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match &self.data {
            Some(value) => Ok(Some(T::deserialize(value)?)),
            None => Ok(None),
        }
    }
}

pub struct DocumentStore {
    storage: Storage,
}

impl DocumentStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn get(&self, collection: &str, id: &str) -> Result<DocumentSnapshot> {
        let data = self.storage.get_json::<Value>(&document_key(collection, id))?;
        Ok(DocumentSnapshot {
            id: id.to_string(),
            data,
        })
    }

    /// Replace the document wholesale.
    pub fn set<T: Serialize + ?Sized>(&self, collection: &str, id: &str, data: &T) -> Result<()> {
        self.storage.set_json(&document_key(collection, id), data)?;

        tracing::debug!(collection, id, "Set document");
        Ok(())
    }

    /// Shallow-merge `fields` onto the stored document. A missing document,
    /// or one that is not a JSON object, is treated as empty.
    pub fn update(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<()> {
        self.storage
            .update_item(&document_key(collection, id), |existing| {
                let mut merged = match existing {
                    Some(raw) => match serde_json::from_str::<Value>(raw)? {
                        Value::Object(map) => map,
                        _ => Map::new(),
                    },
                    None => Map::new(),
                };
                merged.extend(fields);
                let raw = serde_json::to_string(&Value::Object(merged))?;
                Ok::<_, StorageError>(Some(raw))
            })?;

        tracing::debug!(collection, id, "Updated document");
        Ok(())
    }
}

impl Clone for DocumentStore {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

fn document_key(collection: &str, id: &str) -> String {
    format!("doc:{}:{}", collection, id)
}
