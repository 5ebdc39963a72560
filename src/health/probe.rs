//! Startup connectivity probe.
//!
//! # Responsibilities
//! - Open one TCP connection to the backend with a short timeout
//! - Log whether the backend looks reachable
//!
//! # Design Decisions
//! - Advisory only: never blocks startup or request handling
//! - Runs once, as its own task

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time;

use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connectivity test timed out after {0:?}")]
    Timeout(Duration),

    #[error("connectivity test failed: {0}")]
    Connect(#[from] io::Error),
}

/// Connect to `host:port` once; returns the peer address on success.
pub async fn probe_backend(host: &str, port: u16, timeout: Duration) -> Result<SocketAddr, ProbeError> {
    let stream = time::timeout(timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| ProbeError::Timeout(timeout))??;
    Ok(stream.peer_addr()?)
}

/// Run the probe and log the result.
pub async fn run_startup_probe(host: String, port: u16, timeout: Duration) {
    match probe_backend(&host, port, timeout).await {
        Ok(peer) => {
            metrics::record_probe(true);
            tracing::info!(host = %host, port, peer = %peer, "Backend server is reachable");
        }
        Err(err) => {
            metrics::record_probe(false);
            tracing::warn!(
                host = %host,
                port,
                error = %err,
                "Backend may be down or unreachable; proxy will still start, but requests may fail"
            );
        }
    }
}
