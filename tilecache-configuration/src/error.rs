use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[cfg(feature = "redis")]
    #[error("Redis: {0}")]
    Redis(#[from] tilecache_redis::Error),
}
