//! Ledger API server.
//!
//! ```text
//!     Client ──▶ CORS ─▶ security headers ─▶ request id ─▶ envelope
//!                ─▶ request logger ─▶ rate limiter ─▶ router
//!                                                      │
//!                          ┌───────────────────────────┼──────────────┐
//!                          ▼                           ▼              ▼
//!                    /api/auth/*              /api/operations*   /api/healthcheck
//!                    AuthService              (bearer guard)
//!                          │                  LedgerService
//!                          └──────────┬───────────┘
//!                                     ▼
//!                                   Store
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use ledger_api::config::load_config;
use ledger_api::lifecycle::{wait_for_signal, Shutdown};
use ledger_api::observability::{logging, metrics};
use ledger_api::store::InMemoryStore;
use ledger_api::HttpServer;

#[derive(Parser)]
#[command(name = "ledger-api")]
#[command(about = "REST API for recording buy/sell operations", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("failed to load configuration")?;
    logging::init(&config).context("failed to initialise logging")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        mode = %config.mode,
        bind_address = %config.server.bind_address,
        api_version = config.api.version(),
        rate_limit_enabled = config.rate_limit.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse()
            .context("invalid metrics address")?;
        metrics::init_metrics(addr).context("failed to start metrics exporter")?;
    }

    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_address))?;

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_signal().await;
            shutdown.trigger();
        }
    });

    let server = HttpServer::new(config, Arc::new(InMemoryStore::new()));
    server.run(listener, rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
