//! In-memory stores for exercising `TileCacheBackend` without a live server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tilecache_backend::{
    BackendError, BackendResult, DeleteStatus, KeyMetadata, RemainingTtl, TileStore,
};
use tilecache_core::BackendLabel;
use tokio::time::Instant;

#[derive(Clone)]
struct Entry {
    data: Bytes,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// DashMap-backed store with per-key expiry on the tokio clock.
///
/// Every primitive call counts as one command, the metadata pipeline
/// included, so tests can assert how many round-trips an operation made.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Entry>>,
    commands: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commands issued so far.
    pub fn commands(&self) -> usize {
        self.commands.load(Ordering::SeqCst)
    }

    /// Whether a live entry exists, without counting a command.
    pub fn has(&self, key: &str) -> bool {
        self.live(key).is_some()
    }

    /// Raw stored value, without counting a command.
    pub fn raw(&self, key: &str) -> Option<Bytes> {
        self.live(key).map(|entry| entry.data)
    }

    /// Puts a value directly, without counting a command.
    pub fn insert(&self, key: &str, data: impl Into<Bytes>) {
        self.entries.insert(
            key.to_owned(),
            Entry {
                data: data.into(),
                expires_at: None,
            },
        );
    }

    fn live(&self, key: &str) -> Option<Entry> {
        let now = Instant::now();
        let entry = self.entries.get(key).map(|entry| entry.clone())?;
        if entry.is_live(now) {
            Some(entry)
        } else {
            self.entries.remove(key);
            None
        }
    }

    fn count(&self) {
        self.commands.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TileStore for MemoryStore {
    async fn exists(&self, key: &str) -> BackendResult<bool> {
        self.count();
        Ok(self.live(key).is_some())
    }

    async fn set(&self, key: &str, value: Bytes) -> BackendResult<()> {
        self.count();
        self.entries.insert(
            key.to_owned(),
            Entry {
                data: value,
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> BackendResult<bool> {
        self.count();
        let now = Instant::now();
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.is_live(now) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get(&self, key: &str) -> BackendResult<Option<Bytes>> {
        self.count();
        Ok(self.live(key).map(|entry| entry.data))
    }

    async fn delete(&self, key: &str) -> BackendResult<DeleteStatus> {
        self.count();
        let existed = self.live(key).is_some();
        self.entries.remove(key);
        Ok(if existed {
            DeleteStatus::Deleted(1)
        } else {
            DeleteStatus::Missing
        })
    }

    async fn metadata(&self, key: &str) -> BackendResult<KeyMetadata> {
        self.count();
        let now = Instant::now();
        Ok(match self.live(key) {
            Some(entry) => KeyMetadata {
                remaining_ttl: entry
                    .expires_at
                    .map(|at| RemainingTtl::Expires(at.saturating_duration_since(now)))
                    .unwrap_or(RemainingTtl::Persistent),
                memory_usage: Some(entry.data.len() as u64),
            },
            None => KeyMetadata {
                remaining_ttl: RemainingTtl::Missing,
                memory_usage: None,
            },
        })
    }

    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("memory")
    }
}

/// Store whose every command fails.
#[derive(Clone)]
pub struct ErrorStore {
    connection: bool,
    commands: Arc<AtomicUsize>,
}

impl ErrorStore {
    /// Fails like an unreachable server.
    pub fn unreachable() -> Self {
        Self {
            connection: true,
            commands: Arc::default(),
        }
    }

    /// Fails like a server rejecting commands.
    pub fn rejecting() -> Self {
        Self {
            connection: false,
            commands: Arc::default(),
        }
    }

    pub fn commands(&self) -> usize {
        self.commands.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> BackendResult<T> {
        self.commands.fetch_add(1, Ordering::SeqCst);
        if self.connection {
            Err(BackendError::ConnectionError(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "simulated connection refused",
            ))))
        } else {
            Err(BackendError::InternalError(Box::new(std::io::Error::other(
                "simulated WRONGTYPE reply",
            ))))
        }
    }
}

#[async_trait]
impl TileStore for ErrorStore {
    async fn exists(&self, _key: &str) -> BackendResult<bool> {
        self.fail()
    }

    async fn set(&self, _key: &str, _value: Bytes) -> BackendResult<()> {
        self.fail()
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> BackendResult<bool> {
        self.fail()
    }

    async fn get(&self, _key: &str) -> BackendResult<Option<Bytes>> {
        self.fail()
    }

    async fn delete(&self, _key: &str) -> BackendResult<DeleteStatus> {
        self.fail()
    }

    async fn metadata(&self, _key: &str) -> BackendResult<KeyMetadata> {
        self.fail()
    }

    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("error")
    }
}
