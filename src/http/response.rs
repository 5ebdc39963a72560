//! Client-facing error responses.
//!
//! # Responsibilities
//! - Give every synthesized failure the same JSON shape:
//!   `{"error": ..., "message": ..., "details": ...}`
//! - Map the failure kind to its status code
//!
//! # Design Decisions
//! - `details` carries the underlying error text only, never a backtrace
//! - Relayed backend responses never pass through here

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// JSON body of every error the proxy produces itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub details: String,
}

/// A synthesized error response.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
    details: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: &'static str, details: impl Into<String>) -> Self {
        Self {
            status,
            message,
            details: details.into(),
        }
    }

    /// 502: the backend could not be reached or broke the exchange.
    pub fn bad_gateway(details: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            "Unable to connect to backend server",
            details,
        )
    }

    /// 503: the backend never answered the dispatch.
    pub fn service_unavailable(details: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Backend server is not responding",
            details,
        )
    }

    /// 403: the origin gate refused the request.
    pub fn forbidden_origin(details: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            "Origin is not allowed by CORS policy",
            details,
        )
    }

    pub fn not_found(path: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "No route matches the request path",
            path,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self
                .status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: self.message.to_string(),
            details: self.details.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn bad_gateway_shape() {
        let response = ApiError::bad_gateway("connection refused").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            ErrorBody {
                error: "Bad Gateway".into(),
                message: "Unable to connect to backend server".into(),
                details: "connection refused".into(),
            }
        );
    }

    #[test]
    fn service_unavailable_label() {
        let err = ApiError::service_unavailable("dns error");
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.body().error, "Service Unavailable");
        assert_eq!(err.body().message, "Backend server is not responding");
    }

    #[test]
    fn forbidden_label() {
        assert_eq!(ApiError::forbidden_origin("x").body().error, "Forbidden");
        assert_eq!(ApiError::not_found("/x").body().error, "Not Found");
    }
}
