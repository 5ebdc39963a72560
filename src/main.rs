//! Gyeongwon proxy.
//!
//! Forwards browser traffic under `/api` to the backend after an origin
//! check.
//!
//! ```text
//!     Client Request
//!     ─────────────▶ request id ─▶ trace ─▶ origin gate ─┬─▶ /health (liveness)
//!                                               │        │
//!                                   preflight / denied   └─▶ /api/* ─▶ rewrite ─▶ forwarding engine ─▶ Backend
//!                                               ▼                                       │
//!     Client Response ◀──────────────────────────────────────────── relayed response / 502 / 503
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use gyeongwon_proxy::config::load_config;
use gyeongwon_proxy::lifecycle::{signals::forward_signals, Shutdown};
use gyeongwon_proxy::observability::{logging, metrics};
use gyeongwon_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "gyeongwon-proxy")]
#[command(about = "Origin-gated reverse proxy for the Gyeongwon API", long_about = None)]
struct Cli {
    /// Optional TOML configuration file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            // The subscriber is not up yet.
            eprintln!("gyeongwon-proxy: {e}");
            return Err(e.into());
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("gyeongwon-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        port = config.listener.port,
        backend_host = %config.backend.host,
        backend_port = config.backend.port,
        connect_timeout_secs = config.timeouts.connect_secs,
        request_timeout_secs = config.timeouts.request_secs,
        allowed_origins = config.cors.allowed_origins.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address();
    let server = HttpServer::new(config)?;

    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %bind_address, error = %e, "Failed to bind listener");
            return Err(e.into());
        }
    };
    tracing::info!(address = %listener.local_addr()?, "Proxy server listening");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(forward_signals(shutdown));

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
