#![warn(missing_docs)]
//! Store abstraction and tile cache operations for tilecache.
//!
//! A backend is split in two layers:
//!
//! - [`TileStore`] - raw key-value primitives (`EXISTS`, `SET`, `PEXPIRE`,
//!   `GET`, `DEL` and a pipelined metadata query). These return
//!   [`BackendError`]s.
//! - [`TileCache`] - tile-level operations that never fail. The generic
//!   [`TileCacheBackend`] implements it for any store and contains every
//!   store error behind one logging step.
//!
//! If you want to put tiles in another store, implement [`TileStore`] and
//! wrap it in a [`TileCacheBackend`].
mod backend;
mod cache;
mod error;
pub mod metrics;
mod store;

pub use backend::{Operation, TileCacheBackend, TileCacheBackendBuilder, written_at};
pub use cache::TileCache;
pub use error::{BackendError, DeleteStatus};
pub use store::{BackendResult, KeyMetadata, RemainingTtl, TileStore};
