//! Store key derivation.
//!
//! Every tile is stored under a flat string key built from the backend
//! prefix and the tile coordinate:
//!
//! `{prefix}-{z}-{x}-{y}`
//!
//! The numeric suffix is fixed-arity and purely decimal, so two distinct
//! coordinates under one prefix never produce the same key, even when the
//! prefix itself contains dashes. Nothing random or time-based goes into a
//! key, which keeps it stable across restarts.
//!
//! ```
//! use tilecache_core::{TileCoord, derive_key};
//!
//! let coord = TileCoord::new(1, 2, 3);
//! assert_eq!(derive_key("tiles", coord), "tiles-3-1-2");
//! assert_eq!(coord.cache_key("tiles"), "tiles-3-1-2");
//! ```

use crate::TileCoord;

/// Separator between the prefix and the coordinate parts.
const SEPARATOR: char = '-';

/// Builds the store key for `coord` under `prefix`.
pub fn derive_key(prefix: &str, coord: TileCoord) -> String {
    let TileCoord { x, y, z } = coord;
    format!("{prefix}{SEPARATOR}{z}{SEPARATOR}{x}{SEPARATOR}{y}")
}

impl TileCoord {
    /// Store key of this coordinate under `prefix`.
    ///
    /// Shorthand for [`derive_key`].
    pub fn cache_key(&self, prefix: &str) -> String {
        derive_key(prefix, *self)
    }
}
