//! Document store for sessiongate on top of fjall

use fjall::{Config, Keyspace, PersistMode};
use parking_lot::Mutex;
use sessiongate_core::*;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub mod collection;
pub mod projects;
pub mod users;

pub use collection::*;
pub use projects::*;
pub use users::*;

/// Storage engine wrapping a fjall keyspace
#[derive(Clone)]
pub struct StorageEngine {
    keyspace: Arc<Keyspace>,
    /// One lock per collection, serializing writes that read before they write
    write_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl StorageEngine {
    /// Open (or create) a storage engine at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let keyspace = Config::new(path)
            .open()
            .map_err(|e| SessionGateError::Storage(e.to_string()))?;

        Ok(StorageEngine {
            keyspace: Arc::new(keyspace),
            write_locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Create temporary storage engine for testing
    #[cfg(any(test, feature = "test-utils"))]
    pub fn temp() -> Result<(Self, tempfile::TempDir)> {
        let temp_dir = tempfile::tempdir()?;
        let engine = Self::new(temp_dir.path())?;
        Ok((engine, temp_dir))
    }

    /// Open a named collection
    pub fn collection(&self, name: &str) -> Result<Collection> {
        Collection::new(self.clone(), name)
    }

    pub(crate) fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    pub(crate) fn write_lock(&self, collection: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .lock()
            .entry(collection.to_string())
            .or_default()
            .clone()
    }

    /// Persist all changes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .map_err(|e| SessionGateError::Storage(e.to_string()))
    }
}
