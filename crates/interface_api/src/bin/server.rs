//! CID Dispatch - API Server Binary
//!
//! This binary starts the HTTP API server for CID intake and dispatch.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration (in-memory store, simulated insurers)
//! cargo run --bin cid-api
//!
//! # Run against PostgreSQL and the built-in mock insurer endpoint
//! API_DATABASE_URL=postgres://... API_INSURER_MODE=http cargo run --bin cid-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8001)
//! * `API_DATABASE_URL` / `DATABASE_URL` - PostgreSQL connection string; in-memory store when unset
//! * `API_LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)
//! * `API_LOG_FORMAT` - `text` or `json` (default: text)
//! * `API_DISPATCH_MAX_ATTEMPTS` - Calls per insurer, including the first (default: 3)
//! * `API_DISPATCH_BASE_BACKOFF_MS` - Backoff before the first retry (default: 200)
//! * `API_DISPATCH_PER_CALL_TIMEOUT_MS` - Deadline for one insurer call (default: 5000)
//! * `API_DISPATCH_MAX_IN_FLIGHT` - Concurrent insurer calls (default: 32)
//! * `API_INSURER_MODE` - `simulated` or `http` (default: simulated)
//! * `API_INSURER_BASE_URL` - Insurer endpoint base in `http` mode
//! * `API_INSURER_LATENCY_MS` - Simulated insurer delay (default: 0)

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_cid::{InMemorySubmissionStore, SubmissionStore};
use domain_dispatch::{CidService, Dispatcher};
use infra_db::{connect_and_migrate, PostgresSubmissionStore};
use interface_api::config::{ApiConfig, LogFormat};
use interface_api::create_router;

/// Main entry point for the API server.
///
/// Loads configuration, initializes logging, selects the submission store
/// and insurer clients, and serves until Ctrl+C or SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid configuration")?;

    init_tracing(&config);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        insurer_mode = ?config.insurer_mode,
        "Starting CID Dispatch API Server"
    );

    let store = create_store(&config).await?;
    let registry = config
        .insurer_registry()
        .context("failed to build insurer clients")?;
    tracing::info!(providers = ?registry.providers(), "Insurer clients registered");

    let dispatcher = Dispatcher::new(store.clone(), Arc::new(registry), config.retry_policy())
        .with_max_in_flight(config.dispatch_max_in_flight);
    let service = CidService::new(store, dispatcher);

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;
    let app = create_router(service, config);

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(config: &ApiConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// PostgreSQL when a database URL is configured, memory otherwise
async fn create_store(config: &ApiConfig) -> anyhow::Result<Arc<dyn SubmissionStore>> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = connect_and_migrate(url)
                .await
                .context("failed to prepare database")?;
            tracing::info!("Database ready");
            Ok(Arc::new(PostgresSubmissionStore::new(pool)))
        }
        None => {
            tracing::warn!("No database configured, submissions are kept in memory");
            Ok(Arc::new(InMemorySubmissionStore::new()))
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// In-flight requests, including running dispatches, complete before the
/// process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
