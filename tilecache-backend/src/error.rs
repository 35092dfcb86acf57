//! Error types for backend operations.

use thiserror::Error;

/// Error type for store interactions.
///
/// The tile operations of [`TileCache`](crate::TileCache) never return this
/// type: they log it and degrade to a miss or a failed write. It is what the
/// raw [`TileStore`](crate::TileStore) primitives report.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Store-side error not related to reaching the store.
    ///
    /// Wrong value type, rejected command, out-of-memory replies and the like.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// The store could not be reached or the connection broke.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),

    /// The tile payload buffer could not be read.
    #[error("failed to read tile payload: {0}")]
    Payload(#[from] std::io::Error),
}

impl BackendError {
    /// Whether this error means the store was unreachable.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionError(_))
    }
}

/// Outcome of deleting a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// The given number of keys were removed.
    Deleted(u32),
    /// Nothing was stored under the key.
    Missing,
}
