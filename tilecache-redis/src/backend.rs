//! Redis tile store and the Redis tile cache built on it.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::{Client, aio::ConnectionManager};
use tilecache_backend::{
    BackendResult, DeleteStatus, KeyMetadata, RemainingTtl, TileCache, TileCacheBackend,
    TileStore,
};
use tilecache_core::{BackendLabel, LockCacheId, Raw, Tile};
use tokio::sync::OnceCell;
use tracing::trace;
use url::Url;

use crate::config::ConnectionSecurity;
use crate::error::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 6379;
const LOCK_NAMESPACE: &str = "redis";

/// Raw Redis key-value store based on the redis-rs crate.
///
/// It uses a [`ConnectionManager`] for asynchronous network interaction. The
/// connection is opened on first use, so creating a store never blocks on the
/// server and a server that is down at startup only shows up as contained
/// errors later.
///
/// [`ConnectionManager`]: redis::aio::ConnectionManager
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    label: BackendLabel,
}

impl RedisStore {
    /// Creates a store for a `redis://` or `rediss://` connection URL.
    pub fn new(url: &str) -> Result<Self, Error> {
        Ok(Self {
            client: Client::open(url)?,
            connection: OnceCell::new(),
            label: BackendLabel::new_static("redis"),
        })
    }

    /// Sets the label this store reports in logs and metrics.
    pub fn with_label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Create lazy connection to redis via [`ConnectionManager`]
    pub async fn connection(&self) -> Result<&ConnectionManager, Error> {
        trace!("Get connection manager");
        let manager = self
            .connection
            .get_or_try_init(|| {
                trace!("Initialize new redis connection manager");
                self.client.get_connection_manager()
            })
            .await?;
        Ok(manager)
    }

    async fn connection_handle(&self) -> BackendResult<ConnectionManager> {
        Ok(self.connection().await?.clone())
    }
}

#[async_trait]
impl TileStore for RedisStore {
    async fn exists(&self, key: &str) -> BackendResult<bool> {
        let mut con = self.connection_handle().await?;
        let exists: bool = redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(exists)
    }

    async fn set(&self, key: &str, value: Raw) -> BackendResult<()> {
        let mut con = self.connection_handle().await?;
        redis::cmd("SET")
            .arg(key)
            .arg(value.as_ref())
            .query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> BackendResult<bool> {
        let mut con = self.connection_handle().await?;
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let applied: bool = redis::cmd("PEXPIRE")
            .arg(key)
            .arg(ttl_ms)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(applied)
    }

    async fn get(&self, key: &str) -> BackendResult<Option<Raw>> {
        let mut con = self.connection_handle().await?;
        let data: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(data.map(Bytes::from))
    }

    async fn delete(&self, key: &str) -> BackendResult<DeleteStatus> {
        let mut con = self.connection_handle().await?;
        let deleted: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;

        if deleted > 0 {
            Ok(DeleteStatus::Deleted(deleted as u32))
        } else {
            Ok(DeleteStatus::Missing)
        }
    }

    async fn metadata(&self, key: &str) -> BackendResult<KeyMetadata> {
        let mut con = self.connection_handle().await?;

        // Pipeline: PTTL + MEMORY USAGE, one round-trip.
        // MEMORY USAGE answers nil for a missing key.
        let (pttl, memory_usage): (i64, Option<u64>) = redis::pipe()
            .cmd("PTTL")
            .arg(key)
            .cmd("MEMORY")
            .arg("USAGE")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;

        Ok(KeyMetadata {
            remaining_ttl: RemainingTtl::from_pttl(pttl),
            memory_usage,
        })
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }
}

/// Redis tile cache backend.
///
/// A [`TileCacheBackend`] over a [`RedisStore`], configured from a host,
/// port, database index, key prefix and TTL. All [`TileCache`] operations
/// contain Redis errors: they are logged and reported as misses or failed
/// writes.
///
/// ```no_run
/// use std::time::Duration;
/// use tilecache_backend::TileCache;
/// use tilecache_core::{Tile, TileCoord};
/// use tilecache_redis::{ConnectionSecurity, RedisTileCache};
///
/// # async fn run() -> Result<(), tilecache_redis::Error> {
/// let cache = RedisTileCache::builder("tiles")
///     .host("cache.internal")
///     .ttl(Duration::from_secs(3600))
///     .security(ConnectionSecurity::from_env()?)
///     .build()?;
///
/// let mut tile = Tile::new(TileCoord::new(1, 2, 3));
/// let hit = cache.load_tile(&mut tile).await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisTileCache {
    inner: TileCacheBackend<RedisStore>,
}

impl RedisTileCache {
    /// Creates a builder for a cache storing keys under `prefix`.
    #[must_use]
    pub fn builder(prefix: impl Into<String>) -> RedisTileCacheBuilder {
        RedisTileCacheBuilder::new(prefix)
    }

    /// The generic backend this cache delegates to.
    pub fn inner(&self) -> &TileCacheBackend<RedisStore> {
        &self.inner
    }

    /// Store key of `coord`.
    pub fn key(&self, coord: tilecache_core::TileCoord) -> String {
        self.inner.key(coord)
    }
}

#[async_trait]
impl TileCache for RedisTileCache {
    async fn is_cached(&self, tile: &Tile) -> bool {
        self.inner.is_cached(tile).await
    }

    async fn store_tile(&self, tile: &mut Tile) -> bool {
        self.inner.store_tile(tile).await
    }

    async fn load_tile(&self, tile: &mut Tile) -> bool {
        self.inner.load_tile(tile).await
    }

    async fn load_tile_metadata(&self, tile: &mut Tile) {
        self.inner.load_tile_metadata(tile).await
    }

    async fn remove_tile(&self, tile: &Tile) -> bool {
        self.inner.remove_tile(tile).await
    }

    fn label(&self) -> BackendLabel {
        self.inner.label()
    }

    fn prefix(&self) -> &str {
        self.inner.prefix()
    }

    fn ttl(&self) -> Option<Duration> {
        self.inner.ttl()
    }

    fn lock_cache_id(&self) -> &LockCacheId {
        self.inner.lock_cache_id()
    }
}

/// Part of builder pattern implementation for RedisTileCache.
#[derive(Debug, Clone)]
pub struct RedisTileCacheBuilder {
    host: String,
    port: u16,
    db: i64,
    prefix: String,
    ttl: Duration,
    security: ConnectionSecurity,
    label: BackendLabel,
}

impl RedisTileCacheBuilder {
    fn new(prefix: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            db: 0,
            prefix: prefix.into(),
            ttl: Duration::ZERO,
            security: ConnectionSecurity::default(),
            label: BackendLabel::new_static("redis"),
        }
    }

    /// Redis server host name or IP address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Redis server port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Logical database index.
    pub fn db(mut self, db: i64) -> Self {
        self.db = db;
        self
    }

    /// Lifetime of stored tiles. Zero disables expiry.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Lifetime of stored tiles in (possibly fractional) seconds.
    pub fn ttl_secs(self, secs: f64) -> Result<Self, Error> {
        let ttl = Duration::try_from_secs_f64(secs).map_err(|_| {
            Error::InvalidConfig(format!("ttl must be a non-negative number of seconds, got {secs}"))
        })?;
        Ok(self.ttl(ttl))
    }

    /// Credentials and TLS options.
    pub fn security(mut self, security: ConnectionSecurity) -> Self {
        self.security = security;
        self
    }

    /// Set a custom name for this backend, used in logs and metrics.
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Connection URL built from the configured parameters.
    ///
    /// `rediss://` is used when TLS is on. Disabled certificate checks are
    /// passed to the client as the `#insecure` fragment.
    pub fn connection_url(&self) -> Result<Url, Error> {
        if self.host.is_empty() {
            return Err(Error::InvalidConfig("host must not be empty".to_owned()));
        }
        if self.db < 0 {
            return Err(Error::InvalidConfig(format!(
                "db must be a non-negative index, got {}",
                self.db
            )));
        }

        let scheme = if self.security.tls { "rediss" } else { "redis" };
        let host = match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V6(addr)) => format!("[{addr}]"),
            _ => self.host.clone(),
        };
        let mut url = Url::parse(&format!("{scheme}://{host}:{}/{}", self.port, self.db))
            .map_err(|err| Error::InvalidConfig(format!("invalid host {:?}: {err}", self.host)))?;

        if let Some(username) = &self.security.username {
            url.set_username(username)
                .map_err(|()| Error::InvalidConfig("username cannot be set".to_owned()))?;
        }
        if let Some(password) = &self.security.password {
            url.set_password(Some(password))
                .map_err(|()| Error::InvalidConfig("password cannot be set".to_owned()))?;
        }
        if self.security.tls
            && self
                .security
                .cert_reqs
                .is_some_and(|reqs| reqs.is_insecure())
        {
            url.set_fragment(Some("insecure"));
        }
        Ok(url)
    }

    /// Create new instance of the Redis tile cache with passed settings.
    ///
    /// No connection is made here.
    pub fn build(self) -> Result<RedisTileCache, Error> {
        #[cfg(not(feature = "tls"))]
        if self.security.tls {
            return Err(Error::TlsNotEnabled);
        }

        let url = self.connection_url()?;
        let store = RedisStore::new(url.as_str())?.with_label(self.label.clone());
        // Scoped to the server, never to the label.
        let lock_cache_id = LockCacheId::new(
            LOCK_NAMESPACE,
            &self.host,
            self.port,
            &self.prefix,
            self.db,
        );

        let inner = TileCacheBackend::builder(store, self.prefix)
            .ttl(self.ttl)
            .lock_cache_id(lock_cache_id)
            .label(self.label)
            .build();
        Ok(RedisTileCache { inner })
    }
}
