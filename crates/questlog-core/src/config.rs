use thiserror::Error;

use crate::app_config::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup — no
/// `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("QUESTLOG_ENV", "development"));
    let log_level = or_default("QUESTLOG_LOG_LEVEL", "info");
    let steam_api_key = lookup("STEAM_API_KEY").ok();
    let catalog_api_key = lookup("CATALOG_API_KEY").ok();
    let catalog_base_url = or_default("CATALOG_BASE_URL", "https://api.gamecatalog.dev/");

    let db_max_connections = parse_u32("QUESTLOG_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("QUESTLOG_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("QUESTLOG_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let client_request_timeout_secs = parse_u64("QUESTLOG_CLIENT_REQUEST_TIMEOUT_SECS", "30")?;
    let client_user_agent = or_default("QUESTLOG_CLIENT_USER_AGENT", "questlog/0.1 (library-sync)");
    let client_max_retries = parse_u32("QUESTLOG_CLIENT_MAX_RETRIES", "3")?;
    let client_retry_backoff_base_ms = parse_u64("QUESTLOG_CLIENT_RETRY_BACKOFF_BASE_MS", "1000")?;

    let similarity_threshold = parse_f64("QUESTLOG_SIMILARITY_THRESHOLD", "0.3")?;
    let similarity_distance = parse_usize("QUESTLOG_SIMILARITY_DISTANCE", "100")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        steam_api_key,
        catalog_api_key,
        catalog_base_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        client_request_timeout_secs,
        client_user_agent,
        client_max_retries,
        client_retry_backoff_base_ms,
        similarity_threshold,
        similarity_distance,
    })
}

fn parse_environment(raw: &str) -> Environment {
    match raw.to_ascii_lowercase().as_str() {
        "production" | "prod" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from<'a>(map: &'a HashMap<&str, &str>) -> impl Fn(&str) -> Result<String, std::env::VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(std::env::VarError::NotPresent)
        }
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let vars = HashMap::new();
        let err = build_app_config(lookup_from(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(var) if var == "DATABASE_URL"));
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let vars = HashMap::from([("DATABASE_URL", "postgres://localhost/questlog")]);
        let config = build_app_config(lookup_from(&vars)).unwrap();
        assert_eq!(config.env, Environment::Development);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.client_max_retries, 3);
        assert!((config.similarity_threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.similarity_distance, 100);
    }

    #[test]
    fn invalid_numeric_value_is_reported_with_var_name() {
        let vars = HashMap::from([
            ("DATABASE_URL", "postgres://localhost/questlog"),
            ("QUESTLOG_DB_MAX_CONNECTIONS", "lots"),
        ]);
        let err = build_app_config(lookup_from(&vars)).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar { var, .. } if var == "QUESTLOG_DB_MAX_CONNECTIONS")
        );
    }

    #[test]
    fn production_environment_is_recognised() {
        let vars = HashMap::from([
            ("DATABASE_URL", "postgres://localhost/questlog"),
            ("QUESTLOG_ENV", "production"),
        ]);
        let config = build_app_config(lookup_from(&vars)).unwrap();
        assert_eq!(config.env, Environment::Production);
    }
}
