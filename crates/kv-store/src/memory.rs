//! In-process store used by tests and local runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::store::KvStore;

/// A [`KvStore`] held entirely in memory.
///
/// Writes can be switched into a failing mode to simulate an unavailable
/// backend, either everywhere or for a single collection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<(String, String), String>>,
    failure: Mutex<WriteFailure>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
enum WriteFailure {
    #[default]
    None,
    All,
    Collection(String),
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        let mode = if fail { WriteFailure::All } else { WriteFailure::None };
        self.set_failure(mode);
    }

    /// Make subsequent writes to `collection` fail. Cleared by `set_fail_writes(false)`.
    pub fn fail_writes_to(&self, collection: &str) {
        self.set_failure(WriteFailure::Collection(collection.to_string()));
    }

    fn set_failure(&self, mode: WriteFailure) {
        let mut failure = self.failure.lock().unwrap_or_else(|e| e.into_inner());
        *failure = mode;
    }

    fn rejects(&self, collection: &str) -> bool {
        let failure = self.failure.lock().unwrap_or_else(|e| e.into_inner());
        match &*failure {
            WriteFailure::None => false,
            WriteFailure::All => true,
            WriteFailure::Collection(name) => name == collection,
        }
    }

    /// Number of entries stored across all collections.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(collection.to_string(), key.to_string()))
            .cloned())
    }

    async fn set(&self, collection: &str, key: &str, value: &str) -> Result<()> {
        if self.rejects(collection) {
            return Err(StoreError::Unavailable(format!(
                "write to {}/{} rejected",
                collection, key
            )));
        }

        let mut entries = self.entries.write().await;
        entries.insert((collection.to_string(), key.to_string()), value.to_string());
        Ok(())
    }
}
