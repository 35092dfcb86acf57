#![warn(missing_docs)]
//! # tilecache-core
//!
//! Core types shared by the tilecache backends.
//!
//! This crate knows nothing about a particular key-value store. It defines
//! what a [`Tile`] is, how a tile coordinate maps to a store key and how a
//! backend instance is identified for external locking:
//!
//! - [`TileCoord`] and [`Tile`] - the unit the caller hands to a backend
//! - [`TileSource`] - the encoded payload, in memory or on disk
//! - [`derive_key`] - `"<prefix>-<z>-<x>-<y>"` store keys
//! - [`LockCacheId`] - opaque per-backend lock scope
//! - [`BackendLabel`] - backend name used in logs and metrics

pub mod key;
pub mod label;
pub mod lock;
pub mod tile;

pub use key::derive_key;
pub use label::BackendLabel;
pub use lock::LockCacheId;
pub use tile::{Tile, TileCoord, TileSource};

/// Raw payload bytes of an encoded tile.
pub type Raw = bytes::Bytes;
