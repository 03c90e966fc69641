//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the ledger API.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Version echoed in `meta.version` when none is configured.
pub const DEFAULT_API_VERSION: &str = "1.0.0";

/// Placeholder signing secret. Rejected by validation in production mode.
pub const PLACEHOLDER_JWT_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

/// Root configuration for the ledger API.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Execution mode. Gates verbose logging and stack exposure.
    pub mode: RunMode,

    /// Listener and request-level settings.
    pub server: ServerConfig,

    /// Response envelope settings.
    pub api: ApiConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Token signing and lifetime.
    pub auth: AuthConfig,

    /// Security hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// True unless running in production mode.
    pub fn is_development(&self) -> bool {
        self.mode == RunMode::Development
    }
}

/// Execution mode flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Development,
    Production,
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(RunMode::Development),
            "production" | "prod" => Ok(RunMode::Production),
            other => Err(format!("unknown run mode '{}'", other)),
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Development => f.write_str("development"),
            RunMode::Production => f.write_str("production"),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Allowed cross-origin value.
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_body_bytes: 10 * 1024 * 1024, // 10MB
            cors_origin: "http://localhost:3001".to_string(),
        }
    }
}

/// Response envelope configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Version string echoed in every `meta.version`.
    pub version: Option<String>,

    /// Paths whose success bodies are passed through without an envelope.
    /// Exact match on the request path.
    pub envelope_excluded_paths: Vec<String>,
}

impl ApiConfig {
    /// Configured version, or [`DEFAULT_API_VERSION`] when unset or blank.
    pub fn version(&self) -> &str {
        match self.version.as_deref() {
            Some(v) if !v.trim().is_empty() => v,
            _ => DEFAULT_API_VERSION,
        }
    }

    /// Whether `path` bypasses success enveloping.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.envelope_excluded_paths.iter().any(|p| p == path)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version: None,
            envelope_excluded_paths: vec![
                "/health".to_string(),
                "/api/health".to_string(),
                "/status".to_string(),
                "/api/healthcheck".to_string(),
            ],
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Fixed window length in milliseconds.
    pub window_ms: u64,

    /// Maximum requests per client per window.
    pub max_requests: u32,

    /// Upper bound on tracked clients before eviction kicks in.
    pub max_tracked_clients: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: 60 * 1000,
            max_requests: 30,
            max_tracked_clients: 10_000,
        }
    }
}

/// Bearer token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign tokens.
    pub jwt_secret: String,

    /// Token lifetime in seconds.
    pub token_ttl_secs: u64,

    /// Issuer claim.
    pub issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            jwt_secret: PLACEHOLDER_JWT_SECRET.to_string(),
            token_ttl_secs: 24 * 60 * 60,
            issuer: "ledger-api".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security response headers.
    pub enable_headers: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
