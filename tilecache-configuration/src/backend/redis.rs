use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tilecache_backend::TileCache;

use crate::error::ConfigError;

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    6379
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Redis {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub db: i64,
    pub prefix: String,
    /// Tile lifetime in seconds, fractions allowed. `0` disables expiry.
    #[serde(default)]
    pub ttl: f64,
    /// Optional label for this backend (used in metrics/tracing).
    #[serde(default)]
    pub label: Option<String>,
}

impl Redis {
    /// Checks values serde cannot reject on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue("host must not be empty".to_string()));
        }
        if self.db < 0 {
            return Err(ConfigError::InvalidValue(format!(
                "db must be non-negative, got {}",
                self.db
            )));
        }
        if !self.ttl.is_finite() || self.ttl < 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "ttl must be a non-negative number of seconds, got {}",
                self.ttl
            )));
        }
        Ok(())
    }

    /// Builds the Redis tile cache with credentials and TLS from the
    /// process environment.
    #[cfg(feature = "redis")]
    pub fn into_backend(self) -> Result<Arc<dyn TileCache + 'static>, ConfigError> {
        let security = tilecache_redis::ConnectionSecurity::from_env()?;
        self.into_backend_with(security)
    }

    #[cfg(not(feature = "redis"))]
    pub fn into_backend(self) -> Result<Arc<dyn TileCache + 'static>, ConfigError> {
        Err(ConfigError::BackendNotAvailable("Redis".to_string()))
    }

    /// Builds the Redis tile cache with explicit connection security.
    #[cfg(feature = "redis")]
    pub fn into_backend_with(
        self,
        security: tilecache_redis::ConnectionSecurity,
    ) -> Result<Arc<dyn TileCache + 'static>, ConfigError> {
        use tilecache_redis::RedisTileCache;

        self.validate()?;

        let mut builder = RedisTileCache::builder(self.prefix)
            .host(self.host)
            .port(self.port)
            .db(self.db)
            .ttl_secs(self.ttl)?
            .security(security);

        if let Some(label) = self.label {
            builder = builder.label(label);
        }

        Ok(Arc::new(builder.build()?))
    }
}
