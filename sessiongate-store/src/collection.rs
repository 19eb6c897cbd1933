//! Named document collections over fjall partitions
//!
//! Documents are JSON objects stored under `doc:{id}`. Unique-field index
//! entries live in the same partition under `idx:{field}:{json value}` and
//! hold the owning document id.

use fjall::{PartitionCreateOptions, PartitionHandle};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sessiongate_core::*;
use std::sync::Arc;
use tracing::debug;

use crate::StorageEngine;

const DOC_PREFIX: &str = "doc:";
const INDEX_PREFIX: &str = "idx:";

pub struct Collection {
    name: String,
    partition: Arc<PartitionHandle>,
    engine: StorageEngine,
    write_lock: Arc<Mutex<()>>,
}

impl Collection {
    /// Create or open a collection
    pub(crate) fn new(engine: StorageEngine, name: &str) -> Result<Self> {
        let valid_char = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
        if name.is_empty() || !name.chars().all(valid_char) {
            return Err(SessionGateError::Storage(format!("invalid collection name '{}'", name)));
        }

        let partition = Arc::new(
            engine
                .keyspace()
                .open_partition(name, PartitionCreateOptions::default())
                .map_err(|e| SessionGateError::Storage(e.to_string()))?,
        );

        Ok(Collection {
            name: name.to_string(),
            partition,
            write_lock: engine.write_lock(name),
            engine,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetch a document by id
    pub fn get<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        match self.partition.get(doc_key(id)) {
            Ok(Some(bytes)) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(SessionGateError::Storage(e.to_string())),
        }
    }

    /// Store a document, replacing any previous one with the same id
    pub fn set<T: Serialize>(&self, id: &str, doc: &T) -> Result<()> {
        let bytes = serde_json::to_vec(doc)?;
        self.partition
            .insert(doc_key(id), bytes)
            .map_err(|e| SessionGateError::Storage(e.to_string()))?;
        self.engine.persist()
    }

    /// Read-modify-write a document. Returns `false` if it does not exist.
    pub fn update<T, F>(&self, id: &str, apply: F) -> Result<bool>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T),
    {
        let _guard = self.write_lock.lock();

        let mut doc: T = match self.get(id)? {
            Some(doc) => doc,
            None => return Ok(false),
        };
        apply(&mut doc);
        self.set(id, &doc)?;
        Ok(true)
    }

    /// Delete a document and any unique-index entries pointing at it.
    /// Returns `false` if it did not exist.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock();

        let exists = self
            .partition
            .contains_key(doc_key(id))
            .map_err(|e| SessionGateError::Storage(e.to_string()))?;
        if !exists {
            return Ok(false);
        }

        let mut batch = self.engine.keyspace().batch();
        batch.remove(&self.partition, doc_key(id));
        for item in self.partition.prefix(INDEX_PREFIX.as_bytes()) {
            let (key, owner) = item.map_err(|e| SessionGateError::Storage(e.to_string()))?;
            if &*owner == id.as_bytes() {
                batch.remove(&self.partition, key.to_vec());
            }
        }
        batch
            .commit()
            .map_err(|e| SessionGateError::Storage(e.to_string()))?;

        self.engine.persist()?;
        Ok(true)
    }

    /// All documents, in id order
    pub fn list<T: DeserializeOwned>(&self) -> Result<Vec<(String, T)>> {
        self.scan(|_| true, usize::MAX)
    }

    /// Documents whose top-level `field` equals `value`, at most `limit` of them
    pub fn query_by_field<T: DeserializeOwned>(
        &self,
        field: &str,
        value: &Value,
        limit: usize,
    ) -> Result<Vec<(String, T)>> {
        self.scan(|doc| doc.get(field) == Some(value), limit)
    }

    /// Insert a new document unless another document already holds the same
    /// value in `unique_field`.
    ///
    /// The existence check and the write happen under the collection's write
    /// lock, and the document and its index entry are committed in one batch.
    /// Returns `false` and writes nothing when the value is taken.
    pub fn insert_unique<T: Serialize>(
        &self,
        id: &str,
        doc: &T,
        unique_field: &str,
    ) -> Result<bool> {
        let value = serde_json::to_value(doc)?;
        let unique_value = value.get(unique_field).cloned().ok_or_else(|| {
            SessionGateError::Validation(format!("document has no '{}' field", unique_field))
        })?;
        let index_key = index_key(unique_field, &unique_value)?;

        let _guard = self.write_lock.lock();

        let taken = self
            .partition
            .contains_key(&index_key)
            .map_err(|e| SessionGateError::Storage(e.to_string()))?;
        if taken {
            debug!(collection = %self.name, field = unique_field, "unique value already taken");
            return Ok(false);
        }

        let mut batch = self.engine.keyspace().batch();
        batch.insert(&self.partition, doc_key(id), serde_json::to_vec(&value)?);
        batch.insert(&self.partition, index_key, id.as_bytes().to_vec());
        batch
            .commit()
            .map_err(|e| SessionGateError::Storage(e.to_string()))?;

        self.engine.persist()?;
        Ok(true)
    }

    fn scan<T, P>(&self, mut predicate: P, limit: usize) -> Result<Vec<(String, T)>>
    where
        T: DeserializeOwned,
        P: FnMut(&Value) -> bool,
    {
        let mut docs = Vec::new();

        for item in self.partition.prefix(DOC_PREFIX.as_bytes()) {
            if docs.len() >= limit {
                break;
            }

            let (key, bytes) =
                item.map_err(|e| SessionGateError::Storage(format!("Scan error: {}", e)))?;
            let id = std::str::from_utf8(&key[DOC_PREFIX.len()..])
                .map_err(|e| SessionGateError::Storage(format!("non-utf8 document id: {}", e)))?
                .to_string();

            let value: Value = serde_json::from_slice(&bytes)?;
            if predicate(&value) {
                docs.push((id, serde_json::from_value(value)?));
            }
        }

        Ok(docs)
    }
}

// Helper methods for key formatting
fn doc_key(id: &str) -> Vec<u8> {
    format!("{}{}", DOC_PREFIX, id).into_bytes()
}

fn index_key(field: &str, value: &Value) -> Result<Vec<u8>> {
    Ok(format!("{}{}:{}", INDEX_PREFIX, field, serde_json::to_string(value)?).into_bytes())
}
