//! The key/value capability consumed by the chat core.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// Exact-key storage grouped into named collections.
///
/// Implementations give no transactional guarantees across keys. A `get`
/// returning `None` means the key has never been written.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the raw value stored under `collection`/`key`.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<String>>;

    /// Store `value` under `collection`/`key`, replacing any previous value.
    async fn set(&self, collection: &str, key: &str, value: &str) -> Result<()>;
}

/// Fetch and decode a JSON document, or `None` if the key does not exist.
pub async fn get_json<T, S>(store: &S, collection: &str, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: KvStore + ?Sized,
{
    let Some(raw) = store.get(collection, key).await? else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Serialization {
            collection: collection.to_string(),
            key: key.to_string(),
            source,
        })
}

/// Encode a value as JSON and store it.
pub async fn set_json<T, S>(store: &S, collection: &str, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: KvStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialization {
        collection: collection.to_string(),
        key: key.to_string(),
        source,
    })?;

    store.set(collection, key, &raw).await
}
