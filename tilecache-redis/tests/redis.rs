//! Tile operations against a real Redis server.
//!
//! These tests start a Redis container and need a Docker daemon:
//!
//! ```text
//! cargo test -p tilecache-redis -- --ignored
//! ```

use std::time::Duration;

use pretty_assertions::assert_eq;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::redis::{REDIS_PORT, Redis};
use tilecache_backend::{RemainingTtl, TileCache, TileStore};
use tilecache_core::{Tile, TileCoord};
use tilecache_redis::{RedisTileCache, RedisTileCacheBuilder};

async fn start_redis() -> (ContainerAsync<Redis>, String, u16) {
    let container = Redis::default()
        .start()
        .await
        .expect("failed to start Redis container");
    let host = container
        .get_host()
        .await
        .expect("container host")
        .to_string();
    let port = container
        .get_host_port_ipv4(REDIS_PORT)
        .await
        .expect("container port");
    (container, host, port)
}

fn builder(host: &str, port: u16) -> RedisTileCacheBuilder {
    RedisTileCache::builder("tiles").host(host).port(port)
}

#[tokio::test]
#[ignore = "needs docker"]
async fn store_then_load_round_trip() {
    let (_container, host, port) = start_redis().await;
    let cache = builder(&host, port)
        .ttl(Duration::from_secs(3600))
        .build()
        .unwrap();

    let coord = TileCoord::new(1, 2, 3);
    let mut tile = Tile::new(coord).with_source(b"\x89PNG tile".to_vec());
    assert!(cache.store_tile(&mut tile).await);
    assert!(tile.stored);

    let lookup = Tile::new(coord);
    assert!(cache.is_cached(&lookup).await);

    let mut loaded = Tile::new(coord);
    assert!(cache.load_tile(&mut loaded).await);
    assert_eq!(
        loaded.source_bytes().map(|b| b.as_ref()),
        Some(&b"\x89PNG tile"[..])
    );

    // Key layout on the server.
    let raw = cache.inner().store().get("tiles-3-1-2").await.unwrap();
    assert_eq!(raw.as_deref(), Some(&b"\x89PNG tile"[..]));
}

#[tokio::test]
#[ignore = "needs docker"]
async fn missing_tile_is_a_miss() {
    let (_container, host, port) = start_redis().await;
    let cache = builder(&host, port).build().unwrap();

    let mut tile = Tile::new(TileCoord::new(9, 9, 9));
    assert!(!cache.is_cached(&tile).await);
    assert!(!cache.load_tile(&mut tile).await);
    assert_eq!(tile.source, None);
}

#[tokio::test]
#[ignore = "needs docker"]
async fn tiles_expire_after_ttl() {
    let (_container, host, port) = start_redis().await;
    let cache = builder(&host, port)
        .ttl_secs(0.5)
        .unwrap()
        .build()
        .unwrap();

    let coord = TileCoord::new(4, 5, 6);
    let mut tile = Tile::new(coord).with_source(b"short-lived".to_vec());
    assert!(cache.store_tile(&mut tile).await);
    assert!(cache.is_cached(&Tile::new(coord)).await);

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert!(!cache.is_cached(&Tile::new(coord)).await);
}

#[tokio::test]
#[ignore = "needs docker"]
async fn zero_ttl_keys_persist() {
    let (_container, host, port) = start_redis().await;
    let cache = builder(&host, port).build().unwrap();

    let coord = TileCoord::new(0, 0, 0);
    let mut tile = Tile::new(coord).with_source(b"forever".to_vec());
    assert!(cache.store_tile(&mut tile).await);

    let metadata = cache.inner().store().metadata("tiles-0-0-0").await.unwrap();
    assert_eq!(metadata.remaining_ttl, RemainingTtl::Persistent);

    let mut lookup = Tile::new(coord);
    cache.load_tile_metadata(&mut lookup).await;
    assert_eq!(lookup.timestamp, None);
    assert!(lookup.size.is_some());
}

#[tokio::test]
#[ignore = "needs docker"]
async fn metadata_reports_size_and_timestamp() {
    let (_container, host, port) = start_redis().await;
    let cache = builder(&host, port)
        .ttl(Duration::from_secs(600))
        .build()
        .unwrap();

    let payload = vec![7u8; 2048];
    let coord = TileCoord::new(10, 20, 12);
    let before = chrono::Utc::now();
    let mut tile = Tile::new(coord).with_source(payload.clone());
    assert!(cache.store_tile(&mut tile).await);

    let mut lookup = Tile::new(coord);
    cache.load_tile_metadata(&mut lookup).await;

    let size = lookup.size.expect("memory usage");
    assert!(size >= payload.len() as u64);
    // Offset by the 600s TTL plus the ~600s still remaining.
    let timestamp = lookup.timestamp.expect("timestamp");
    let expected = before - chrono::Duration::seconds(1200);
    let drift = (timestamp - expected).num_milliseconds().abs();
    assert!(drift < 2_000, "timestamp off by {drift}ms");
}

#[tokio::test]
#[ignore = "needs docker"]
async fn metadata_of_missing_tile_is_empty() {
    let (_container, host, port) = start_redis().await;
    let cache = builder(&host, port)
        .ttl(Duration::from_secs(60))
        .build()
        .unwrap();

    let mut lookup = Tile::new(TileCoord::new(3, 3, 3));
    cache.load_tile_metadata(&mut lookup).await;
    assert_eq!(lookup.size, None);
    assert_eq!(lookup.timestamp, None);
}

#[tokio::test]
#[ignore = "needs docker"]
async fn remove_is_idempotent() {
    let (_container, host, port) = start_redis().await;
    let cache = builder(&host, port).build().unwrap();

    let coord = TileCoord::new(1, 1, 1);
    let mut tile = Tile::new(coord).with_source(b"gone soon".to_vec());
    assert!(cache.store_tile(&mut tile).await);

    assert!(cache.remove_tile(&Tile::new(coord)).await);
    assert!(!cache.is_cached(&Tile::new(coord)).await);
    assert!(cache.remove_tile(&Tile::new(coord)).await);
}

#[tokio::test]
#[ignore = "needs docker"]
async fn databases_are_isolated() {
    let (_container, host, port) = start_redis().await;
    let db0 = builder(&host, port).db(0).build().unwrap();
    let db1 = builder(&host, port).db(1).build().unwrap();

    let coord = TileCoord::new(2, 2, 2);
    let mut tile = Tile::new(coord).with_source(b"db0 only".to_vec());
    assert!(db0.store_tile(&mut tile).await);

    assert!(db0.is_cached(&Tile::new(coord)).await);
    assert!(!db1.is_cached(&Tile::new(coord)).await);
}

// The connection manager retries the initial connection, which makes this
// one slow.
#[tokio::test]
#[ignore = "slow: waits for connection retries"]
async fn unreachable_server_is_contained() {
    let cache = RedisTileCache::builder("tiles")
        .port(1)
        .ttl(Duration::from_secs(60))
        .build()
        .unwrap();

    let coord = TileCoord::new(1, 2, 3);
    assert!(!cache.is_cached(&Tile::new(coord)).await);

    let mut tile = Tile::new(coord).with_source(b"payload".to_vec());
    assert!(!cache.store_tile(&mut tile).await);
    assert!(!tile.stored);

    let mut lookup = Tile::new(coord);
    assert!(!cache.load_tile(&mut lookup).await);
    cache.load_tile_metadata(&mut lookup).await;
    assert_eq!(lookup.size, None);
    assert!(cache.remove_tile(&lookup).await);
}
