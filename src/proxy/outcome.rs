//! Result of one forwarding attempt.

use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};

use crate::http::response::ApiError;
use crate::proxy::error::{FailureKind, ForwardError};

/// Exactly one of these is produced per forwarded request and consumed into
/// the client response.
#[derive(Debug)]
pub enum ForwardOutcome {
    /// Backend status, headers and (streaming) body.
    Relayed(Response<Body>),
    /// 502.
    GatewayError(ForwardError),
    /// 503.
    ServiceUnavailable(ForwardError),
}

impl ForwardOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardOutcome::Relayed(response) => response.status(),
            ForwardOutcome::GatewayError(_) => StatusCode::BAD_GATEWAY,
            ForwardOutcome::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ForwardOutcome::Relayed(_) => "relayed",
            ForwardOutcome::GatewayError(_) => "gateway_error",
            ForwardOutcome::ServiceUnavailable(_) => "service_unavailable",
        }
    }
}

impl From<ForwardError> for ForwardOutcome {
    fn from(err: ForwardError) -> Self {
        match err.kind() {
            FailureKind::Gateway => ForwardOutcome::GatewayError(err),
            FailureKind::Unavailable => ForwardOutcome::ServiceUnavailable(err),
        }
    }
}

impl IntoResponse for ForwardOutcome {
    fn into_response(self) -> axum::response::Response {
        match self {
            ForwardOutcome::Relayed(response) => response,
            ForwardOutcome::GatewayError(err) => ApiError::bad_gateway(err.details()).into_response(),
            ForwardOutcome::ServiceUnavailable(err) => {
                ApiError::service_unavailable(err.details()).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn timeout_becomes_service_unavailable() {
        let outcome = ForwardOutcome::from(ForwardError::ConnectionTimeout(Duration::from_secs(60)));
        assert_eq!(outcome.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(outcome.label(), "service_unavailable");

        let response = outcome.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn relayed_response_is_untouched() {
        let backend = Response::builder()
            .status(StatusCode::IM_A_TEAPOT)
            .header("x-backend", "yes")
            .body(Body::from("short and stout"))
            .unwrap();
        let response = ForwardOutcome::Relayed(backend).into_response();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(response.headers()["x-backend"], "yes");
    }
}
