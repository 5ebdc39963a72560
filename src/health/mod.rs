//! Health subsystem.
//!
//! # Data Flow
//! ```text
//! Liveness (this module):
//!     GET /health → 200 {"status":"ok","service":"gyeongwon-proxy"}
//!
//! Startup probe (probe.rs):
//!     server start → one TCP connect to the backend → log result
//! ```
//!
//! # Design Decisions
//! - Liveness reflects this process only, never the backend
//! - Probe outcome is advisory and never changes what clients see

pub mod probe;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// Name reported by the liveness endpoint.
pub const SERVICE_NAME: &str = "gyeongwon-proxy";

/// Liveness body. Field order is part of the response contract.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
}

pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthStatus {
            status: "ok",
            service: SERVICE_NAME,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn literal_body() {
        let response = health_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"status":"ok","service":"gyeongwon-proxy"}"#);
    }
}
