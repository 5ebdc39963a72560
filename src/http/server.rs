//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, origin gate)
//! - Dispatch requests under the published prefix to the forwarding engine
//! - Kick off the startup connectivity probe
//!
//! # Layer order (outermost first)
//! ```text
//! SetRequestId → Trace → PropagateRequestId → origin_gate → handlers
//! ```

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header::InvalidHeaderValue, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::health::{health_handler, probe::run_startup_probe};
use crate::http::request::{request_id, UuidRequestId, X_REQUEST_ID};
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::proxy::{target::TargetError, BackendTarget, ForwardingEngine};
use crate::routing::ProxyRoute;
use crate::security::{origin_gate, OriginGate};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub route: Arc<ProxyRoute>,
    pub engine: ForwardingEngine,
}

/// Errors turning a validated config into a running server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid CORS header value: {0}")]
    Cors(#[from] InvalidHeaderValue),

    #[error(transparent)]
    Target(#[from] TargetError),
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    engine: ForwardingEngine,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let route = Arc::new(ProxyRoute::new(config.route.path_prefix.clone()));
        let target = BackendTarget::from_config(&config.backend, &config.timeouts)?;
        let engine = ForwardingEngine::new(target);
        let gate = Arc::new(
            OriginGate::from_config(&config.cors)?.exempt(config.listener.health_path.clone()),
        );

        let state = AppState {
            route,
            engine: engine.clone(),
        };

        let router = Self::build_router(&config, gate, state);
        Ok(Self {
            router,
            config,
            engine,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, gate: Arc<OriginGate>, state: AppState) -> Router {
        Router::new()
            .route(&config.listener.health_path, get(health_handler))
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(middleware::from_fn_with_state(gate, origin_gate))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The composed router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        let target = self.engine.target();
        tracing::info!(
            address = %addr,
            backend = %target.base_url(),
            prefix = %self.config.route.path_prefix,
            "HTTP server starting"
        );

        if self.config.probe.enabled {
            tracing::info!("Testing backend connectivity");
            tokio::spawn(run_startup_probe(
                target.host().to_string(),
                target.port(),
                Duration::from_secs(self.config.probe.timeout_secs),
            ));
        }

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Rewrites the path and hands the request to the forwarding engine.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let rewritten = match state.route.rewrite(request.uri()) {
        Some(Ok(rewritten)) => rewritten,
        Some(Err(err)) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %err, "Path rewrite failed");
            metrics::record_request(method.as_str(), 400, "rejected", start_time);
            return ApiError::new(
                StatusCode::BAD_REQUEST,
                "Request path could not be rewritten",
                err.to_string(),
            )
            .into_response();
        }
        None => {
            tracing::warn!(request_id = %request_id, path = %path, "No route matched");
            metrics::record_request(method.as_str(), 404, "no_route", start_time);
            return ApiError::not_found(&path).into_response();
        }
    };

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        backend_path = %rewritten,
        "Proxying request"
    );

    let outcome = state.engine.forward(request, rewritten).await;
    metrics::record_request(
        method.as_str(),
        outcome.status().as_u16(),
        outcome.label(),
        start_time,
    );
    outcome.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::{header, Method};
    use tower::ServiceExt;

    fn server() -> HttpServer {
        let mut config = ProxyConfig::default();
        config.backend.host = "backend.invalid".into();
        config.probe.enabled = false;
        HttpServer::new(config).unwrap()
    }

    #[tokio::test]
    async fn health_ignores_backend() {
        let response = server()
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"status":"ok","service":"gyeongwon-proxy"}"#);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let response = server()
            .router()
            .oneshot(Request::get("/apix/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn preflight_on_any_path() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/anything/at/all")
                    .header(header::ORIGIN, "capacitor://localhost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "capacitor://localhost"
        );
    }

    #[tokio::test]
    async fn client_request_id_is_kept() {
        let response = server()
            .router()
            .oneshot(
                Request::get("/health")
                    .header(X_REQUEST_ID, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[X_REQUEST_ID], "req-42");
    }

    #[test]
    fn bad_cors_header_is_rejected() {
        let mut config = ProxyConfig::default();
        config.cors.allowed_headers = vec!["X-Bad\nHeader".into()];
        assert!(matches!(HttpServer::new(config), Err(ServerError::Cors(_))));
    }
}
