use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tilecache_backend::TileCache;

use crate::error::ConfigError;

mod redis;

pub use redis::Redis;

/// Tile cache backend configuration, selected by its `type` field.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum Backend {
    Redis(Redis),
}

impl Backend {
    /// Parses a YAML backend document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_saphyr::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Builds the configured backend. No connection is made here.
    pub fn into_backend(self) -> Result<Arc<dyn TileCache + 'static>, ConfigError> {
        match self {
            Backend::Redis(config) => config.into_backend(),
        }
    }
}
