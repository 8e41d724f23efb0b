//! Runtime error types.

use herald_storage::StorageError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while assembling or running the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The storage backend could not be reached.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The configured storage backend was compiled out.
    #[error("Storage backend '{0}' is not available, enable the matching cargo feature")]
    BackendUnavailable(&'static str),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
