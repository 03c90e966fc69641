//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window > 0, limits > 0, addresses parse)
//! - Refuse the placeholder signing secret in production
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;

use crate::auth::jwt::MAX_TTL_SECS;
use crate::config::schema::{AppConfig, RunMode, PLACEHOLDER_JWT_SECRET};
use crate::security::rate_limit::MAX_WINDOW_MS;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::new("server.max_body_bytes", "must be greater than 0"));
    }
    if HeaderValue::from_str(&config.server.cors_origin).is_err() {
        errors.push(ValidationError::new(
            "server.cors_origin",
            "must be a valid header value",
        ));
    }

    if config.rate_limit.window_ms == 0 || config.rate_limit.window_ms > MAX_WINDOW_MS {
        errors.push(ValidationError::new(
            "rate_limit.window_ms",
            format!("must be between 1 and {}", MAX_WINDOW_MS),
        ));
    }
    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than 0"));
    }
    if config.rate_limit.max_tracked_clients == 0 {
        errors.push(ValidationError::new(
            "rate_limit.max_tracked_clients",
            "must be greater than 0",
        ));
    }

    if config.auth.jwt_secret.is_empty() {
        errors.push(ValidationError::new("auth.jwt_secret", "must not be empty"));
    } else if config.mode == RunMode::Production && config.auth.jwt_secret == PLACEHOLDER_JWT_SECRET {
        errors.push(ValidationError::new(
            "auth.jwt_secret",
            "placeholder secret is not allowed in production",
        ));
    }
    if config.auth.token_ttl_secs == 0 || config.auth.token_ttl_secs > MAX_TTL_SECS {
        errors.push(ValidationError::new(
            "auth.token_ttl_secs",
            format!("must be between 1 and {}", MAX_TTL_SECS),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.server.bind_address = "nowhere".into();
        config.rate_limit.window_ms = 0;
        config.rate_limit.max_requests = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["server.bind_address", "rate_limit.window_ms", "rate_limit.max_requests"]
        );
    }

    #[test]
    fn test_production_rejects_placeholder_secret() {
        let mut config = AppConfig::default();
        config.mode = RunMode::Production;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "auth.jwt_secret");

        config.auth.jwt_secret = "a-real-secret".into();
        assert!(validate_config(&config).is_ok());
    }
}
