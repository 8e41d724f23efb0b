//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{
    DispatchConfig, HeraldConfig, LogOutput, LoggingConfig, StorageBackend, StorageConfig,
};

/// Longest accepted callback payload lifetime (one year).
pub const MAX_CALLBACK_DATA_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Longest accepted in-memory sweep interval (one day).
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Validates the entire configuration.
pub fn validate_config(config: &HeraldConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_storage_config(&config.storage)?;
    validate_dispatch_config(&config.dispatch)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

fn validate_storage_config(storage: &StorageConfig) -> ConfigResult<()> {
    if storage.sweep_interval_secs == 0 {
        return Err(ConfigError::validation(
            "storage.sweep_interval_secs must be greater than 0",
        ));
    }

    if storage.sweep_interval_secs > MAX_SWEEP_INTERVAL_SECS {
        return Err(ConfigError::validation(format!(
            "storage.sweep_interval_secs must be at most {MAX_SWEEP_INTERVAL_SECS}"
        )));
    }

    if storage.backend == StorageBackend::Redis {
        let url = storage
            .redis_url
            .as_deref()
            .ok_or_else(|| ConfigError::missing_field("storage.redis_url"))?;

        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err(ConfigError::invalid_url(
                url,
                "URL must start with redis:// or rediss://",
            ));
        }
    }

    Ok(())
}

fn validate_dispatch_config(dispatch: &DispatchConfig) -> ConfigResult<()> {
    if dispatch.callback_data_ttl_secs == 0 {
        return Err(ConfigError::validation(
            "dispatch.callback_data_ttl_secs must be greater than 0",
        ));
    }

    if dispatch.callback_data_ttl_secs > MAX_CALLBACK_DATA_TTL_SECS {
        return Err(ConfigError::validation(format!(
            "dispatch.callback_data_ttl_secs must be at most {MAX_CALLBACK_DATA_TTL_SECS}"
        )));
    }

    if dispatch.default_locale.trim().is_empty() {
        return Err(ConfigError::missing_field("dispatch.default_locale"));
    }

    if dispatch.platform.trim().is_empty() {
        return Err(ConfigError::missing_field("dispatch.platform"));
    }

    Ok(())
}
