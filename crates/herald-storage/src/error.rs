//! Storage error types.

use thiserror::Error;

/// Errors raised by storage backends.
///
/// A missing key is never an error; it is reported as `None`.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Redis returned an error or the connection failed.
    #[cfg(feature = "redis")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A stored value could not be interpreted by its reader.
    #[error("corrupt value under '{key}': {reason}")]
    Corrupt {
        /// The offending key.
        key: String,
        /// Why it could not be read.
        reason: String,
    },
}

impl StorageError {
    pub fn corrupt(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
