//! Configuration loading from disk and the process environment.

use std::env;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    Env { key: &'static str, message: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then
/// environment overrides. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    let config = apply_env_overrides(config, |key| env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables on top of `config`.
///
/// `lookup` abstracts the environment so tests don't mutate process state.
pub fn apply_env_overrides<F>(mut config: AppConfig, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(mode) = lookup("APP_ENV") {
        config.mode = mode
            .parse()
            .map_err(|message| ConfigError::Env { key: "APP_ENV", message })?;
    }

    if let Some(port) = lookup("PORT") {
        let port: u16 = port.trim().parse().map_err(|e| ConfigError::Env {
            key: "PORT",
            message: format!("{}", e),
        })?;
        let host = config
            .server
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.server.bind_address = format!("{}:{}", host, port);
    }

    if let Some(version) = lookup("API_VERSION") {
        config.api.version = Some(version);
    }

    if let Some(origin) = lookup("CORS_ORIGIN") {
        config.server.cors_origin = origin;
    }

    if let Some(secret) = lookup("JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }

    if let Some(ttl) = lookup("JWT_EXPIRES_IN") {
        config.auth.token_ttl_secs = ttl.trim().parse().map_err(|e| ConfigError::Env {
            key: "JWT_EXPIRES_IN",
            message: format!("{}", e),
        })?;
    }

    Ok(config)
}
