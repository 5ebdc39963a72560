//! Upstream failure taxonomy.
//!
//! # Classification (by the stage the failure happened in)
//! ```text
//! resolve failed            → Unavailable (request never dispatched)
//! connect timed out         → Unavailable
//! no response within budget → Unavailable
//! refused / reset / broken  → Gateway
//! anything else             → Gateway
//! ```

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::proxy::resolver::ResolveError;

/// Which error response a failure turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 502 Bad Gateway.
    Gateway,
    /// 503 Service Unavailable.
    Unavailable,
}

/// A forwarding attempt that produced no backend response.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("backend did not respond within {0:?}")]
    ConnectionTimeout(Duration),

    #[error("proxied request exceeded {0:?}")]
    RequestTimeout(Duration),

    #[error(transparent)]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("could not build backend request: {0}")]
    Request(#[from] axum::http::Error),
}

impl ForwardError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ForwardError::ConnectionTimeout(_) | ForwardError::RequestTimeout(_) => {
                FailureKind::Unavailable
            }
            ForwardError::Upstream(err) => classify(err),
            ForwardError::Request(_) => FailureKind::Gateway,
        }
    }

    /// Underlying error text, outermost first, joined with ": ".
    pub fn details(&self) -> String {
        error_chain(self)
    }
}

/// Classify a transport error by walking its source chain.
pub fn classify(err: &(dyn StdError + 'static)) -> FailureKind {
    let mut current = Some(err);
    while let Some(err) = current {
        if err.is::<ResolveError>() {
            return FailureKind::Unavailable;
        }
        if let Some(io) = err.downcast_ref::<io::Error>() {
            if io.kind() == io::ErrorKind::TimedOut {
                return FailureKind::Unavailable;
            }
        }
        current = err.source();
    }
    FailureKind::Gateway
}

/// Render `err` and all of its sources, skipping repeated messages.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current = Some(err);
    while let Some(err) = current {
        let text = err.to_string();
        if parts.last() != Some(&text) {
            parts.push(text);
        }
        current = err.source();
    }
    parts.join(": ")
}
