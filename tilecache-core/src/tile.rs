//! Tiles and their payloads.
//!
//! A [`Tile`] is owned by the caller (the tile-serving pipeline) and lent to
//! a backend for the duration of one operation. The backend only fills in
//! what it learns from the store: the payload on a load, the `stored` flag
//! after a write and the `timestamp`/`size` metadata on a refresh.

use std::fmt;
use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Position of a tile in the raster pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Zoom level.
    pub z: u8,
}

impl TileCoord {
    /// Creates a coordinate from column, row and zoom level.
    pub const fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

impl From<(u32, u32, u8)> for TileCoord {
    fn from((x, y, z): (u32, u32, u8)) -> Self {
        Self::new(x, y, z)
    }
}

/// Encoded tile payload.
///
/// The payload is opaque to the cache: it is whatever bytes the encoder
/// produced. It either lives in memory or in a file the caller wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileSource {
    /// Payload already held in memory.
    Memory(Bytes),
    /// Payload stored in a file.
    File(PathBuf),
}

impl TileSource {
    /// Wraps an in-memory payload.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Memory(data.into())
    }

    /// Refers to a payload stored at `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// In-memory payload, if this source holds one.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Memory(data) => Some(data),
            Self::File(_) => None,
        }
    }

    /// Drains the whole payload into memory.
    ///
    /// For file-backed sources the file is opened, read to the end and
    /// closed before this returns, on success and on error alike.
    pub async fn read_all(&self) -> io::Result<Bytes> {
        match self {
            Self::Memory(data) => Ok(data.clone()),
            Self::File(path) => {
                let mut buffer = File::open(path).await?;
                let mut data = Vec::new();
                buffer.read_to_end(&mut data).await?;
                Ok(Bytes::from(data))
            }
        }
    }
}

impl From<Bytes> for TileSource {
    fn from(data: Bytes) -> Self {
        Self::Memory(data)
    }
}

impl From<Vec<u8>> for TileSource {
    fn from(data: Vec<u8>) -> Self {
        Self::Memory(Bytes::from(data))
    }
}

/// One addressable tile as seen by a cache backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tile {
    /// Tile position; `None` for a tile that cannot be addressed.
    pub coord: Option<TileCoord>,
    /// Encoded payload, present once the tile is resolved.
    pub source: Option<TileSource>,
    /// Set once this tile instance is known to be persisted.
    pub stored: bool,
    /// Approximate time the tile was written to the store.
    pub timestamp: Option<DateTime<Utc>>,
    /// Size of the stored entry in bytes, as reported by the store.
    pub size: Option<u64>,
}

impl Tile {
    /// Creates an unresolved tile at `coord`.
    pub fn new(coord: impl Into<TileCoord>) -> Self {
        Self {
            coord: Some(coord.into()),
            ..Self::default()
        }
    }

    /// Creates a tile without a coordinate.
    pub fn unaddressed() -> Self {
        Self::default()
    }

    /// Attaches a payload.
    pub fn with_source(mut self, source: impl Into<TileSource>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the in-memory payload, if any.
    pub fn source_bytes(&self) -> Option<&Bytes> {
        self.source.as_ref().and_then(TileSource::as_bytes)
    }
}
