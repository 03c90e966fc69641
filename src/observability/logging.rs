//! Structured logging.
//!
//! `RUST_LOG` wins over the configured level when set. Production emits
//! one JSON object per event; development uses the human readable format.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;

/// Install the global subscriber.
///
/// Returns an error when a subscriber is already installed.
pub fn init(config: &AppConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.observability.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_development() {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .try_init()
    }
}

fn default_directives(level: &str) -> String {
    format!("ledger_api={level},tower_http={level}")
}
