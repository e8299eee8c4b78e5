//! Portfolio feeds service.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────────┐
//!                       │                   FEEDS SERVICE                      │
//!                       │                                                      │
//!   GET /api/<feed>     │  ┌────────┐   ┌──────────┐   ┌─────────┐             │
//!   ────────────────────┼─▶│  http  │──▶│   feed   │──▶│  cache  │ fresh? ──┐  │
//!                       │  │ server │   │ resolve  │   │   ttl   │          │  │
//!                       │  └────────┘   └────┬─────┘   └─────────┘          │  │
//!                       │                    │ miss                         │  │
//!                       │                    ▼                              │  │
//!                       │             ┌────────────┐   ┌──────────┐         │  │   Spotify
//!                       │             │ providers  │──▶│ upstream │─────────┼──┼─▶ Lanyard
//!                       │             │  fetch     │   │   http   │         │  │   Umami
//!                       │             └─────┬──────┘   └──────────┘         │  │   GitHub
//!                       │                   ▼                               │  │   Sanity
//!                       │             ┌────────────┐                        │  │
//!                       │             │  validate  │── ok → cache.put       │  │
//!                       │             └─────┬──────┘                        │  │
//!                       │                   ▼ err                           │  │
//!                       │          degrade: stale → fallback → error        │  │
//!   Client Response     │  ┌────────────┐                                   │  │
//!   ◀───────────────────┼──│  response  │◀──────────────────────────────────┘  │
//!                       │  └────────────┘                                      │
//!                       └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use portfolio_feeds::cache::SystemClock;
use portfolio_feeds::config::{load_config, EnvSource, FeedsConfig, Secrets};
use portfolio_feeds::lifecycle::{bootstrap, signals, Shutdown};
use portfolio_feeds::observability::{logging, metrics};
use portfolio_feeds::{AppState, HttpServer};

#[derive(Parser)]
#[command(name = "portfolio-feeds", version, about = "Cached upstream data feeds for a portfolio site")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "FEEDS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => FeedsConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "portfolio-feeds starting");
    tracing::info!(
        config = ?args.config,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let secrets = Secrets::resolve(&config, &EnvSource)?;
    let feeds = bootstrap(&config, &secrets, Arc::new(SystemClock))?;

    let state = AppState {
        feeds: Arc::new(feeds),
        admin_api_key: secrets.admin_api_key.as_deref().map(Arc::from),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(&config, state);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
