//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use herald_framework::DispatchSettings;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeraldConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format. `json` needs the `json-log` feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// File rotation when `output = "file"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events to log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    /// Per-module levels, e.g. `herald_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file and line of each event.
    #[serde(default)]
    pub file_location: bool,

    #[serde(default)]
    pub span_events: SpanEventConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            rotation: LogRotation::Never,
            filters: HashMap::new(),
            thread_ids: false,
            file_location: false,
            span_events: SpanEventConfig::default(),
        }
    }
}

// =============================================================================
// Storage
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process store and queue.
    #[default]
    Memory,
    /// Redis store and queue, requires the `redis` feature.
    Redis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Connection URL for the Redis backend.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// How often the in-memory backend drops expired entries.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            redis_url: None,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl StorageConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn default_sweep_interval_secs() -> u64 {
    60
}

// =============================================================================
// Dispatch
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Lifetime of callback button payloads.
    #[serde(default = "default_callback_data_ttl_secs")]
    pub callback_data_ttl_secs: u64,

    /// Locale for senders without one and for invalid-action notices.
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// Platform segment of rate-limit keys.
    #[serde(default = "default_platform")]
    pub platform: String,

    /// How long shutdown waits for in-flight dispatches.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            callback_data_ttl_secs: default_callback_data_ttl_secs(),
            default_locale: default_locale(),
            platform: default_platform(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl DispatchConfig {
    pub fn to_settings(&self) -> DispatchSettings {
        DispatchSettings {
            callback_data_ttl: Duration::from_secs(self.callback_data_ttl_secs),
            default_locale: self.default_locale.clone(),
            platform: self.platform.clone(),
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn default_callback_data_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_locale() -> String {
    herald_core::FALLBACK_LOCALE.to_string()
}

fn default_platform() -> String {
    "telegram".to_string()
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: HeraldConfig = serde_json::from_str(
            r#"{"storage": {"backend": "redis", "redis_url": "redis://localhost"}}"#,
        )
        .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Redis);
        assert_eq!(config.storage.sweep_interval_secs, 60);
        assert_eq!(config.dispatch.callback_data_ttl_secs, 86400);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_dispatch_settings() {
        let settings = DispatchConfig {
            callback_data_ttl_secs: 30,
            ..Default::default()
        }
        .to_settings();

        assert_eq!(settings.callback_data_ttl, Duration::from_secs(30));
        assert_eq!(settings.default_locale, "en");
        assert_eq!(settings.platform, "telegram");
    }
}
