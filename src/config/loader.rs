//! Configuration loading from disk and the process environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{AppConfig, Environment};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {message}")]
    Env { key: &'static str, message: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = read_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the process configuration: optional file, then environment overrides,
/// then validation.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment variables onto `config`.
///
/// Empty values count as unset. `APP_ENV` is applied first because it
/// decides how `CORS_ORIGIN` is read. `NODE_ENV` and `MONGODB_URI` are
/// accepted when `APP_ENV` and `DATABASE_URI` are unset.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some((key, value)) = first_set(&var, &["APP_ENV", "NODE_ENV"]) {
        config.environment = value
            .parse::<Environment>()
            .map_err(|message| ConfigError::Env { key, message })?;
    }

    if let Some(value) = var("PORT") {
        let port: u16 = parse_var("PORT", &value)?;
        let mut addr: SocketAddr = config.server.bind_address.parse().map_err(|_| ConfigError::Env {
            key: "PORT",
            message: format!("cannot apply to bind address '{}'", config.server.bind_address),
        })?;
        addr.set_port(port);
        config.server.bind_address = addr.to_string();
    }

    if let Some((_, value)) = first_set(&var, &["DATABASE_URI", "MONGODB_URI"]) {
        config.database.uri = Some(value);
    }

    if let Some(value) = var("JWT_SECRET") {
        config.auth.jwt_secret = value;
    }

    if let Some(value) = var("CORS_ORIGIN") {
        config.cors.origins = if config.environment == Environment::Development {
            value
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect()
        } else {
            vec![value.trim().to_string()]
        };
    }

    if let Some(value) = var("RATE_LIMIT_WINDOW_MS") {
        config.rate_limit.window_ms = parse_var("RATE_LIMIT_WINDOW_MS", &value)?;
    }

    if let Some(value) = var("RATE_LIMIT_MAX") {
        config.rate_limit.max_requests = parse_var("RATE_LIMIT_MAX", &value)?;
    }

    Ok(())
}

/// First of `keys` that is set, in order.
fn first_set<F>(var: &F, keys: &[&'static str]) -> Option<(&'static str, String)>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter().find_map(|&key| var(key).map(|value| (key, value)))
}

fn parse_var<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        key,
        message: format!("'{}': {}", value, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("APP_ENV", "production"),
                ("PORT", "4100"),
                ("DATABASE_URI", "mongodb://localhost:27017/gas"),
                ("JWT_SECRET", "abc"),
                ("CORS_ORIGIN", "https://gas.example.com"),
                ("RATE_LIMIT_WINDOW_MS", "60000"),
                ("RATE_LIMIT_MAX", "20"),
            ]),
        )
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.server.bind_address, "0.0.0.0:4100");
        assert_eq!(config.database.uri.as_deref(), Some("mongodb://localhost:27017/gas"));
        assert_eq!(config.auth.jwt_secret, "abc");
        assert_eq!(config.cors.origins, vec!["https://gas.example.com"]);
        assert_eq!(config.rate_limit.window_ms, 60_000);
        assert_eq!(config.rate_limit.max_requests, 20);
    }

    #[test]
    fn test_legacy_env_names_used_as_fallback() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("NODE_ENV", "production"),
                ("MONGODB_URI", "mongodb://legacy:27017/gas"),
            ]),
        )
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.database.uri.as_deref(), Some("mongodb://legacy:27017/gas"));

        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("APP_ENV", "test"),
                ("NODE_ENV", "production"),
                ("DATABASE_URI", "mongodb://primary/gas"),
                ("MONGODB_URI", "mongodb://legacy/gas"),
            ]),
        )
        .unwrap();
        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.database.uri.as_deref(), Some("mongodb://primary/gas"));
    }

    #[test]
    fn test_bad_legacy_env_reports_its_name() {
        let mut config = AppConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("NODE_ENV", "staging")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: "NODE_ENV", .. }));
    }

    #[test]
    fn test_cors_list_in_development() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[("CORS_ORIGIN", "http://localhost:3000, http://127.0.0.1:3000,")]),
        )
        .unwrap();
        assert_eq!(
            config.cors.origins,
            vec!["http://localhost:3000", "http://127.0.0.1:3000"]
        );
    }

    #[test]
    fn test_empty_values_ignored() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, env(&[("JWT_SECRET", ""), ("PORT", " ")])).unwrap();
        assert!(config.auth.jwt_secret.is_empty());
        assert_eq!(config.server.bind_address, "0.0.0.0:8000");
    }

    #[test]
    fn test_bad_number_reported() {
        let mut config = AppConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("RATE_LIMIT_MAX", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: "RATE_LIMIT_MAX", .. }));
    }

    #[test]
    fn test_load_config_from_file() {
        let path = std::env::temp_dir().join(format!("gas-price-api-{}.toml", std::process::id()));
        fs::write(
            &path,
            r#"
            [auth]
            jwt_secret = "from-file"

            [retries]
            max_retries = 5
            "#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.auth.jwt_secret, "from-file");
        assert_eq!(config.retries.max_retries, 5);

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_load_config_rejects_zero_heartbeat() {
        let path = std::env::temp_dir().join(format!("gas-price-api-hb-{}.toml", std::process::id()));
        fs::write(
            &path,
            "[auth]\njwt_secret = \"x\"\n\n[database]\nheartbeat_interval_ms = 0\n",
        )
        .unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("heartbeat_interval_ms"));

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let path = std::env::temp_dir().join(format!("gas-price-api-bad-{}.toml", std::process::id()));
        fs::write(&path, "[retries]\nmax_retries = -3\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("must not be negative"));

        fs::remove_file(&path).unwrap_or_default();
    }
}
