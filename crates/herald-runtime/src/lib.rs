//! Herald Runtime - orchestration layer for the Herald bot framework.
//!
//! This crate provides:
//! - Layered configuration (`herald.toml`, profiles, `HERALD_*` variables)
//! - Logging setup and a panic hook that reports through `tracing`
//! - Storage backend selection (in-memory with a sweeper, or Redis)
//! - [`HeraldRuntime`], which pulls updates from an [`UpdateSource`] and
//!   shuts down gracefully
//!
//! ```ignore
//! use herald_runtime::HeraldRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = HeraldRuntime::builder().build(client, router).await?;
//!     runtime.run(updates).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod source;

pub use config::{ConfigError, ConfigLoader, ConfigResult, HeraldConfig, Profile};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents, install_panic_hook};
pub use runtime::{HeraldRuntime, RuntimeBuilder};
pub use source::UpdateSource;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Commonly used logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
