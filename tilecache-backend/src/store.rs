use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tilecache_core::{BackendLabel, Raw};

use crate::{BackendError, DeleteStatus};

/// Result of a raw store primitive.
pub type BackendResult<T> = Result<T, BackendError>;

/// Remaining lifetime of a key, as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingTtl {
    /// Key expires after the given duration.
    Expires(Duration),
    /// Key exists without an expiry.
    Persistent,
    /// Key does not exist.
    Missing,
}

impl RemainingTtl {
    /// Interprets a `PTTL` reply: `-2` missing, `-1` no expiry, otherwise
    /// milliseconds left.
    pub fn from_pttl(pttl: i64) -> Self {
        match pttl {
            -2 => Self::Missing,
            ms if ms < 0 => Self::Persistent,
            ms => Self::Expires(Duration::from_millis(ms as u64)),
        }
    }
}

/// Store-provided hints about one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMetadata {
    /// Time left before the key expires.
    pub remaining_ttl: RemainingTtl,
    /// Bytes the store spends on the key and its value.
    pub memory_usage: Option<u64>,
}

/// Raw key-value primitives a tile cache needs from its store.
///
/// One call is one round-trip, except [`metadata`](TileStore::metadata)
/// which must query both hints in a single pipelined exchange.
#[async_trait]
pub trait TileStore: Sync + Send {
    /// Whether `key` holds a value.
    async fn exists(&self, key: &str) -> BackendResult<bool>;

    /// Writes `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Raw) -> BackendResult<()>;

    /// Sets the time-to-live of `key` with millisecond precision.
    ///
    /// Returns `false` when the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> BackendResult<bool>;

    /// Reads the value under `key`, `None` when absent.
    async fn get(&self, key: &str) -> BackendResult<Option<Raw>>;

    /// Deletes `key`.
    async fn delete(&self, key: &str) -> BackendResult<DeleteStatus>;

    /// Remaining lifetime and memory usage of `key`.
    async fn metadata(&self, key: &str) -> BackendResult<KeyMetadata>;

    /// Name of this store, used in logs and metrics.
    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("store")
    }
}

#[async_trait]
impl<S> TileStore for Arc<S>
where
    S: TileStore + ?Sized,
{
    async fn exists(&self, key: &str) -> BackendResult<bool> {
        (**self).exists(key).await
    }

    async fn set(&self, key: &str, value: Raw) -> BackendResult<()> {
        (**self).set(key, value).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> BackendResult<bool> {
        (**self).expire(key, ttl).await
    }

    async fn get(&self, key: &str) -> BackendResult<Option<Raw>> {
        (**self).get(key).await
    }

    async fn delete(&self, key: &str) -> BackendResult<DeleteStatus> {
        (**self).delete(key).await
    }

    async fn metadata(&self, key: &str) -> BackendResult<KeyMetadata> {
        (**self).metadata(key).await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}

#[async_trait]
impl TileStore for Box<dyn TileStore> {
    async fn exists(&self, key: &str) -> BackendResult<bool> {
        (**self).exists(key).await
    }

    async fn set(&self, key: &str, value: Raw) -> BackendResult<()> {
        (**self).set(key, value).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> BackendResult<bool> {
        (**self).expire(key, ttl).await
    }

    async fn get(&self, key: &str) -> BackendResult<Option<Raw>> {
        (**self).get(key).await
    }

    async fn delete(&self, key: &str) -> BackendResult<DeleteStatus> {
        (**self).delete(key).await
    }

    async fn metadata(&self, key: &str) -> BackendResult<KeyMetadata> {
        (**self).metadata(key).await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }
}
