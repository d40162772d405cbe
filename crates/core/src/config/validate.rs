use super::{types::Config, ConfigError};
use crate::strategy::StrategyCatalog;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Retrieval limits and timeouts are non-zero and consistent
/// - Every configured strategy name is known
/// - Janitor intervals are non-zero when enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    let retrieval = &config.retrieval;
    if retrieval.max_bytes == 0 {
        return Err(invalid("retrieval.max_bytes cannot be 0"));
    }
    if retrieval.per_attempt_timeout_secs == 0 {
        return Err(invalid("retrieval.per_attempt_timeout_secs cannot be 0"));
    }
    if retrieval.overall_timeout_secs == 0 {
        return Err(invalid("retrieval.overall_timeout_secs cannot be 0"));
    }
    if retrieval.overall_timeout_secs < retrieval.per_attempt_timeout_secs {
        return Err(invalid(
            "retrieval.overall_timeout_secs must be at least per_attempt_timeout_secs",
        ));
    }

    StrategyCatalog::new(&config.strategies).map_err(|e| invalid(&e.to_string()))?;

    if config.janitor.enabled {
        if config.janitor.sweep_interval_secs == 0 {
            return Err(invalid("janitor.sweep_interval_secs cannot be 0"));
        }
        if config.janitor.max_age_secs == 0 {
            return Err(invalid("janitor.max_age_secs cannot be 0"));
        }
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
