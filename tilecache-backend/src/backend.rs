//! Failure-contained tile cache on top of a [`TileStore`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tilecache_core::{BackendLabel, LockCacheId, Tile, TileCoord, TileSource, derive_key};
use tracing::{debug, error, warn};

use crate::metrics::{self, Timer};
use crate::{
    BackendError, BackendResult, DeleteStatus, KeyMetadata, RemainingTtl, TileCache, TileStore,
};

/// Store interaction a contained error or a metric is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Existence query.
    Exists,
    /// Payload write, including draining the tile buffer.
    Store,
    /// Expiry set after a write.
    Expire,
    /// Payload read.
    Load,
    /// Pipelined TTL and memory usage query.
    Metadata,
    /// Key deletion.
    Remove,
}

impl Operation {
    /// Stable lowercase name, used as the `operation` label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exists => "exists",
            Self::Store => "store",
            Self::Expire => "expire",
            Self::Load => "load",
            Self::Metadata => "metadata",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tile cache backend over any [`TileStore`].
///
/// Derives `"<prefix>-<z>-<x>-<y>"` keys, sets a millisecond-precision
/// expiry after every write when a TTL is configured, and routes every store
/// result through one containment step that logs errors with the key and
/// turns them into misses or failed writes.
///
/// ```ignore
/// let cache = TileCacheBackend::builder(store, "tiles")
///     .ttl(Duration::from_secs(3600))
///     .build();
///
/// let mut tile = Tile::new(TileCoord::new(1, 2, 3));
/// if !cache.load_tile(&mut tile).await {
///     // render, then
///     cache.store_tile(&mut tile).await;
/// }
/// ```
#[derive(Clone)]
pub struct TileCacheBackend<S> {
    store: S,
    prefix: String,
    ttl: Option<Duration>,
    lock_cache_id: LockCacheId,
    label: BackendLabel,
}

impl<S> TileCacheBackend<S>
where
    S: TileStore,
{
    /// Starts building a backend that stores keys under `prefix`.
    pub fn builder(store: S, prefix: impl Into<String>) -> TileCacheBackendBuilder<S> {
        TileCacheBackendBuilder {
            store,
            prefix: prefix.into(),
            ttl: None,
            lock_cache_id: None,
            label: None,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store key of `coord` for this backend.
    pub fn key(&self, coord: TileCoord) -> String {
        derive_key(&self.prefix, coord)
    }

    /// Attempt-or-degrade: passes successes through, logs and counts errors.
    fn contain<T>(&self, operation: Operation, key: &str, result: BackendResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                metrics::record_error(self.label.as_str(), operation);
                if err.is_connection() {
                    error!(
                        backend = %self.label,
                        key = %key,
                        %operation,
                        error = %err,
                        "Error during connection to tile store"
                    );
                } else {
                    error!(
                        backend = %self.label,
                        key = %key,
                        %operation,
                        error = %err,
                        "Tile store operation failed"
                    );
                }
                None
            }
        }
    }

    fn finish(&self, operation: Operation, timer: &Timer) {
        metrics::record_operation(self.label.as_str(), operation, timer.elapsed());
    }

    async fn write(&self, key: &str, source: &TileSource) -> bool {
        // The buffer is drained and dropped before the store sees the key.
        let payload = source.read_all().await.map_err(BackendError::from);
        let Some(payload) = self.contain(Operation::Store, key, payload) else {
            return false;
        };
        let payload_len = payload.len();

        debug!(backend = %self.label, key = %key, bytes = payload_len, "store_key");
        let written = self.store.set(key, payload).await;
        if self.contain(Operation::Store, key, written).is_none() {
            return false;
        }
        metrics::record_write_bytes(self.label.as_str(), payload_len);

        if let Some(ttl) = self.ttl {
            let ttl_ms = ttl.as_millis() as u64;
            debug!(backend = %self.label, key = %key, ttl_ms, "expire_key");
            let expired = self.store.expire(key, ttl).await;
            if self.contain(Operation::Expire, key, expired).is_none() {
                return false;
            }
        }
        true
    }

    fn apply_metadata(&self, tile: &mut Tile, metadata: KeyMetadata, now: DateTime<Utc>) {
        tile.size = metadata.memory_usage;
        tile.timestamp = written_at(self.ttl, metadata.remaining_ttl, now);
    }
}

/// Timestamp of a cached key: `now - ttl - remaining`.
///
/// Without a configured TTL, or for keys that carry no expiry, there is no
/// remaining lifetime to offset by and `None` is returned.
pub fn written_at(
    ttl: Option<Duration>,
    remaining: RemainingTtl,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let (Some(ttl), RemainingTtl::Expires(left)) = (ttl, remaining) else {
        return None;
    };
    let offset = chrono::Duration::from_std(ttl.saturating_add(left)).ok()?;
    now.checked_sub_signed(offset)
}

#[async_trait]
impl<S> TileCache for TileCacheBackend<S>
where
    S: TileStore,
{
    async fn is_cached(&self, tile: &Tile) -> bool {
        let Some(coord) = tile.coord else {
            return true;
        };
        if tile.source.is_some() {
            return true;
        }

        let key = self.key(coord);
        let timer = Timer::new();
        debug!(backend = %self.label, key = %key, "exists_key");
        let exists = self.store.exists(&key).await;
        let exists = self.contain(Operation::Exists, &key, exists);
        self.finish(Operation::Exists, &timer);
        exists.unwrap_or(false)
    }

    async fn store_tile(&self, tile: &mut Tile) -> bool {
        if tile.stored {
            return true;
        }
        let Some(coord) = tile.coord else {
            return true;
        };
        let key = self.key(coord);
        let Some(source) = tile.source.as_ref() else {
            warn!(backend = %self.label, key = %key, "Tile has no payload to store");
            return false;
        };

        let timer = Timer::new();
        let stored = self.write(&key, source).await;
        self.finish(Operation::Store, &timer);

        if stored {
            tile.stored = true;
        }
        stored
    }

    async fn load_tile(&self, tile: &mut Tile) -> bool {
        if tile.source.is_some() {
            return true;
        }
        let Some(coord) = tile.coord else {
            return true;
        };

        let key = self.key(coord);
        let timer = Timer::new();
        debug!(backend = %self.label, key = %key, "get_key");
        let data = self.store.get(&key).await;
        let data: Option<Bytes> = self.contain(Operation::Load, &key, data).flatten();
        self.finish(Operation::Load, &timer);

        match data {
            Some(data) if !data.is_empty() => {
                metrics::record_read_bytes(self.label.as_str(), data.len());
                metrics::record_load_result(self.label.as_str(), true);
                tile.source = Some(TileSource::Memory(data));
                true
            }
            _ => {
                metrics::record_load_result(self.label.as_str(), false);
                false
            }
        }
    }

    async fn load_tile_metadata(&self, tile: &mut Tile) {
        if tile.timestamp.is_some() {
            return;
        }
        let Some(coord) = tile.coord else {
            return;
        };

        let key = self.key(coord);
        let timer = Timer::new();
        debug!(backend = %self.label, key = %key, "key_metadata");
        let metadata = self.store.metadata(&key).await;
        let metadata = self.contain(Operation::Metadata, &key, metadata);
        self.finish(Operation::Metadata, &timer);

        if let Some(metadata) = metadata {
            self.apply_metadata(tile, metadata, Utc::now());
        }
    }

    async fn remove_tile(&self, tile: &Tile) -> bool {
        let Some(coord) = tile.coord else {
            return true;
        };

        let key = self.key(coord);
        let timer = Timer::new();
        let status = self.store.delete(&key).await;
        let status = self.contain(Operation::Remove, &key, status);
        self.finish(Operation::Remove, &timer);

        match status {
            Some(DeleteStatus::Deleted(count)) => {
                debug!(backend = %self.label, key = %key, count, "delete_key");
                true
            }
            Some(DeleteStatus::Missing) => {
                debug!(backend = %self.label, key = %key, "delete_key: already missing");
                true
            }
            // Remove reports success whatever the delete outcome.
            None => true,
        }
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn lock_cache_id(&self) -> &LockCacheId {
        &self.lock_cache_id
    }
}

/// Builder for [`TileCacheBackend`].
pub struct TileCacheBackendBuilder<S> {
    store: S,
    prefix: String,
    ttl: Option<Duration>,
    lock_cache_id: Option<LockCacheId>,
    label: Option<BackendLabel>,
}

impl<S> TileCacheBackendBuilder<S>
where
    S: TileStore,
{
    /// Lifetime of written tiles. `Duration::ZERO` means tiles never expire.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = (!ttl.is_zero()).then_some(ttl);
        self
    }

    /// Lock scope of this backend.
    ///
    /// Defaults to an identifier derived from the store label and prefix
    /// only; stores reachable over the network should pass one that also
    /// covers their address.
    pub fn lock_cache_id(mut self, lock_cache_id: LockCacheId) -> Self {
        self.lock_cache_id = Some(lock_cache_id);
        self
    }

    /// Overrides the label taken from the store.
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Creates the backend. No store round-trip happens here.
    pub fn build(self) -> TileCacheBackend<S> {
        let label = self.label.unwrap_or_else(|| self.store.label());
        let lock_cache_id = self
            .lock_cache_id
            .unwrap_or_else(|| LockCacheId::new(label.as_str(), "", 0, &self.prefix, 0));
        TileCacheBackend {
            store: self.store,
            prefix: self.prefix,
            ttl: self.ttl,
            lock_cache_id,
            label,
        }
    }
}
