//! Lock scope identifier.

use std::fmt;

use sha2::{Digest, Sha256};

/// Opaque identifier scoping external per-backend locks.
///
/// Two backend instances pointing at the same store, database and prefix get
/// the same identifier, so a lock taken through one of them is honoured by
/// the other. The identifier is computed once when a backend is built and is
/// never parsed back; it has the shape `{label}-{sha256 hex}`.
///
/// ```
/// use tilecache_core::LockCacheId;
///
/// let a = LockCacheId::new("redis", "localhost", 6379, "tiles", 0);
/// let b = LockCacheId::new("redis", "localhost", 6379, "tiles", 0);
/// assert_eq!(a, b);
/// assert!(a.as_str().starts_with("redis-"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockCacheId(String);

impl LockCacheId {
    /// Derives the identifier of a backend reachable at `host:port`, using
    /// database `db` and key prefix `prefix`.
    pub fn new(label: &str, host: &str, port: u16, prefix: &str, db: i64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(host.as_bytes());
        hasher.update(port.to_string().as_bytes());
        hasher.update(prefix.as_bytes());
        hasher.update(db.to_string().as_bytes());
        Self(format!("{label}-{:x}", hasher.finalize()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockCacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
