//! numclass-api - Number classification microservice
//!
//! Serves `GET /api/classify-number?number=N`, classifying N (prime, perfect,
//! Armstrong, parity, digit sum) and attaching a fun fact fetched from an
//! external trivia service under a bounded time budget.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use numclass_common::{DeliveryPolicy, TomlConfig};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use numclass_api::services::{Enricher, NumbersApiClient};
use numclass_api::{build_router, AppState};

/// Command-line arguments for numclass-api
#[derive(Parser, Debug)]
#[command(name = "numclass-api")]
#[command(about = "Number classification microservice")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "NUMCLASS_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "NUMCLASS_HOST")]
    host: Option<String>,

    /// Path to TOML config file (falls back to NUMCLASS_CONFIG, then the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fun fact delivery policy: inline, deferred, pool or fail_fast
    #[arg(long, env = "NUMCLASS_POLICY")]
    policy: Option<DeliveryPolicy>,

    /// Trivia service base URL
    #[arg(long, env = "NUMCLASS_TRIVIA_URL")]
    trivia_url: Option<String>,
}

impl Args {
    /// Layer command-line and environment overrides onto file configuration
    fn apply(&self, mut config: TomlConfig) -> TomlConfig {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(policy) = self.policy {
            config.trivia.policy = policy;
        }
        if let Some(url) = &self.trivia_url {
            config.trivia.base_url = url.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    let config = args.apply(config);

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting numclass-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!(
        policy = %config.trivia.policy,
        budget_ms = config.trivia.budget().as_millis() as u64,
        trivia_url = %config.trivia.base_url,
        "Fun fact enrichment configured"
    );

    let client = NumbersApiClient::new(&config.trivia).context("Failed to build trivia client")?;
    let enricher = Enricher::new(Arc::new(client), config.trivia.clone());
    let state = AppState::new(enricher);
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", config.host, config.port))?;
    let addr = listener.local_addr().context("Failed to read bound address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    state.enricher.shutdown();
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
