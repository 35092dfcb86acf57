//! Error types for the Redis backend.
//!
//! Building a [`RedisTileCache`] returns [`Error`] directly: a bad address,
//! an unknown certificate mode or TLS requested from a build without the
//! `tls` feature are setup defects the caller must see.
//!
//! Once built, store errors are converted to [`BackendError`] and contained
//! by the tile operations. [`From<Error> for BackendError`] decides whether a
//! failure means the server was unreachable ([`BackendError::ConnectionError`])
//! or rejected a command ([`BackendError::InternalError`]).
//!
//! [`RedisTileCache`]: crate::RedisTileCache
//! [`BackendError`]: tilecache_backend::BackendError
//! [`BackendError::ConnectionError`]: tilecache_backend::BackendError::ConnectionError
//! [`BackendError::InternalError`]: tilecache_backend::BackendError::InternalError

use redis::RedisError;
use tilecache_backend::BackendError;

/// Error type for Redis backend setup and commands.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying Redis client.
    ///
    /// Covers invalid connection parameters at build time and connection,
    /// protocol and command failures afterwards.
    #[error("Redis backend error: {0}")]
    Redis(#[from] RedisError),

    /// A connection parameter could not be used.
    #[error("Invalid Redis configuration: {0}")]
    InvalidConfig(String),

    /// TLS was requested but this build has no TLS support.
    #[error("TLS requested but tilecache-redis was built without the `tls` feature")]
    TlsNotEnabled,
}

impl Error {
    /// Whether this error means Redis could not be reached.
    pub fn is_connection(&self) -> bool {
        match self {
            Self::Redis(err) => {
                err.is_io_error()
                    || err.is_connection_refusal()
                    || err.is_connection_dropped()
                    || err.is_timeout()
            }
            Self::InvalidConfig(_) | Self::TlsNotEnabled => false,
        }
    }
}

impl From<Error> for BackendError {
    fn from(error: Error) -> Self {
        if error.is_connection() {
            Self::ConnectionError(Box::new(error))
        } else {
            Self::InternalError(Box::new(error))
        }
    }
}
