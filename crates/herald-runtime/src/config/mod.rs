//! Configuration for the Herald runtime.
//!
//! Settings are layered with figment from defaults, config files and
//! `HERALD_*` environment variables, then validated before use.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile};
pub use schema::{
    DispatchConfig, HeraldConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    SpanEventConfig, StorageBackend, StorageConfig,
};
pub use validation::validate_config;
