//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, windows > 0)
//! - Check that required secrets are present for the environment
//! - Make sure the retry section builds a valid policy
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{AppConfig, Environment};
use crate::resilience::policy::{PolicyError, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("auth.jwt_secret is required")]
    MissingJwtSecret,

    #[error("cors.origins must list at least one origin")]
    NoCorsOrigins,

    #[error("rate_limit.window_ms must be greater than zero")]
    ZeroRateLimitWindow,

    #[error("rate_limit.max_requests must be greater than zero")]
    ZeroRateLimitMax,

    #[error("retries: {0}")]
    Retry(PolicyError),

    #[error("database.uri is invalid: {0}")]
    InvalidDatabaseUri(String),

    #[error("database.connect_timeout_ms must be greater than zero")]
    ZeroConnectTimeout,

    #[error("database.heartbeat_interval_ms must be greater than zero")]
    ZeroHeartbeatInterval,
}

/// Check every semantic rule and collect all violations.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.server.bind_address.clone()));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.environment != Environment::Test && config.auth.jwt_secret.trim().is_empty() {
        errors.push(ValidationError::MissingJwtSecret);
    }

    if config.cors.origins.iter().all(|o| o.trim().is_empty()) {
        errors.push(ValidationError::NoCorsOrigins);
    }

    if config.rate_limit.enabled {
        if config.rate_limit.window_ms == 0 {
            errors.push(ValidationError::ZeroRateLimitWindow);
        }
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::ZeroRateLimitMax);
        }
    }

    if let Err(e) = RetryPolicy::try_from(&config.retries) {
        errors.push(ValidationError::Retry(e));
    }

    if let Some(uri) = &config.database.uri {
        if let Err(e) = check_database_uri(uri) {
            errors.push(e);
        }
    }
    if config.database.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }
    if config.database.heartbeat_interval_ms == 0 {
        errors.push(ValidationError::ZeroHeartbeatInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_database_uri(uri: &str) -> Result<(), ValidationError> {
    let parsed = Url::parse(uri).map_err(|e| ValidationError::InvalidDatabaseUri(e.to_string()))?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::InvalidDatabaseUri(format!("'{}' has no host", uri)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "s3cret".into();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_jwt_secret_optional_in_test_env() {
        let mut config = AppConfig::default();
        config.environment = Environment::Test;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.server.bind_address = "not-an-address".into();
        config.rate_limit.window_ms = 0;
        config.retries.max_retries = -1;
        config.database.uri = Some("mongodb:///nohost".into());

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::InvalidBindAddress("not-an-address".into())));
        assert!(errors.contains(&ValidationError::MissingJwtSecret));
        assert!(errors.contains(&ValidationError::ZeroRateLimitWindow));
        assert!(errors.contains(&ValidationError::Retry(PolicyError::NegativeRetries(-1))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidDatabaseUri(_))));
    }

    #[test]
    fn test_rate_limit_ignored_when_disabled() {
        let mut config = valid_config();
        config.rate_limit.enabled = false;
        config.rate_limit.max_requests = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_database_timings_rejected() {
        let mut config = valid_config();
        config.database.connect_timeout_ms = 0;
        config.database.heartbeat_interval_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::ZeroConnectTimeout, ValidationError::ZeroHeartbeatInterval]
        );
    }

    #[test]
    fn test_retry_delays_checked() {
        let mut config = valid_config();
        config.retries.base_delay_ms = 5_000;
        config.retries.max_delay_ms = 1_000;
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::Retry(PolicyError::BaseExceedsMax { .. })]
        ));
    }
}
