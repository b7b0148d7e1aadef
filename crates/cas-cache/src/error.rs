//! Cache error types.

use std::fmt;

/// Errors reported by a cache provider.
///
/// A cache failure never decides an authentication outcome: callers log it
/// and fall back to asking the CAS server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A value could not be encoded for the store or decoded from it.
    Serialization(String),
    /// The backing store could not be reached.
    Unavailable(String),
    /// The store did not answer in time.
    Timeout,
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialization(msg) => write!(f, "cache value encoding failed: {msg}"),
            Self::Unavailable(msg) => write!(f, "cache store unavailable: {msg}"),
            Self::Timeout => f.write_str("cache store timed out"),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
