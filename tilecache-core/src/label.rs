//! Backend label type.
//!
//! A [`BackendLabel`] names one backend instance. It shows up as the
//! `backend` field of every log line a backend emits, as the `backend`
//! label of its metrics and as the namespace of its [`LockCacheId`].
//!
//! [`LockCacheId`]: crate::LockCacheId

use smol_str::SmolStr;
use std::fmt;

/// Name of a tile cache backend.
///
/// ```
/// use tilecache_core::BackendLabel;
///
/// let label = BackendLabel::new_static("redis");
/// assert_eq!(label.as_str(), "redis");
/// assert_eq!(BackendLabel::from("tiles-l2").to_string(), "tiles-l2");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BackendLabel(SmolStr);

impl BackendLabel {
    /// Creates a label from any string.
    #[inline]
    pub fn new(s: impl Into<SmolStr>) -> Self {
        Self(s.into())
    }

    /// Creates a label from a static string without allocating.
    #[inline]
    pub const fn new_static(s: &'static str) -> Self {
        Self(SmolStr::new_static(s))
    }

    /// Returns the label as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for BackendLabel {
    #[inline]
    fn from(s: &str) -> Self {
        Self(SmolStr::new(s))
    }
}

impl From<String> for BackendLabel {
    #[inline]
    fn from(s: String) -> Self {
        Self(SmolStr::from(s))
    }
}
