use std::time::Duration;

use async_trait::async_trait;
use tilecache_core::{BackendLabel, LockCacheId, Tile};

/// Tile-level cache operations.
///
/// This is the surface a tile-serving pipeline talks to. None of the
/// operations fail: a store that cannot be reached looks like a cache that
/// does not hold the tile, and a write that did not make it reports `false`.
/// A `false` is always safe to act on by rendering the tile again.
///
/// Tiles without a coordinate and tiles the caller already resolved are
/// answered without touching the store.
#[async_trait]
pub trait TileCache: Send + Sync {
    /// Whether the tile is available, either locally or in the store.
    async fn is_cached(&self, tile: &Tile) -> bool;

    /// Writes the tile payload to the store and marks the tile as stored.
    async fn store_tile(&self, tile: &mut Tile) -> bool;

    /// Fills `tile.source` from the store.
    async fn load_tile(&self, tile: &mut Tile) -> bool;

    /// Fills `tile.size` and, when it can be reconstructed, `tile.timestamp`.
    async fn load_tile_metadata(&self, tile: &mut Tile);

    /// Deletes the tile from the store. Deleting a missing tile succeeds.
    async fn remove_tile(&self, tile: &Tile) -> bool;

    /// Loads the tile and, on a hit, its metadata.
    async fn load_tile_with_metadata(&self, tile: &mut Tile) -> bool {
        if !self.load_tile(tile).await {
            return false;
        }
        self.load_tile_metadata(tile).await;
        true
    }

    /// Stores every tile in order; `true` only if all of them were stored.
    async fn store_tiles(&self, tiles: &mut [Tile]) -> bool {
        let mut all_stored = true;
        for tile in tiles.iter_mut() {
            all_stored &= self.store_tile(tile).await;
        }
        all_stored
    }

    /// Loads every tile in order; `true` only if all of them were found.
    async fn load_tiles(&self, tiles: &mut [Tile]) -> bool {
        let mut all_loaded = true;
        for tile in tiles.iter_mut() {
            all_loaded &= self.load_tile(tile).await;
        }
        all_loaded
    }

    /// Name of this backend for logs and metrics.
    fn label(&self) -> BackendLabel;

    /// Namespace prepended to every key.
    fn prefix(&self) -> &str;

    /// Lifetime given to written tiles, `None` when they never expire.
    fn ttl(&self) -> Option<Duration>;

    /// Scope for external locks on this backend instance.
    fn lock_cache_id(&self) -> &LockCacheId;
}
