//! Forwarding engine.
//!
//! # Responsibilities
//! - Build the backend request (rewritten path, `Host`, hop-by-hop stripped)
//! - Dispatch it through the pooled upstream client
//! - Enforce the connection-level and request-level budgets
//! - Turn the result into exactly one [`ForwardOutcome`]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{uri::PathAndQuery, Request, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time::{self, Instant};

use crate::proxy::body::relay_until;
use crate::proxy::error::ForwardError;
use crate::proxy::outcome::ForwardOutcome;
use crate::proxy::resolver::BackendResolver;
use crate::proxy::target::BackendTarget;
use crate::security::headers::{rewrite_host, strip_hop_by_hop};

/// Stand-in deadline for budgets too large to add to `Instant::now()`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Pooled HTTP client used for every backend call.
pub type UpstreamClient = Client<HttpConnector<BackendResolver>, Body>;

/// Forwards requests to the single backend.
#[derive(Clone)]
pub struct ForwardingEngine {
    target: Arc<BackendTarget>,
    client: UpstreamClient,
}

impl ForwardingEngine {
    pub fn new(target: BackendTarget) -> Self {
        let mut connector = HttpConnector::new_with_resolver(BackendResolver);
        connector.set_connect_timeout(Some(target.connect_timeout));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            target: Arc::new(target),
            client,
        }
    }

    pub fn target(&self) -> &BackendTarget {
        &self.target
    }

    /// Forward `request` to `path` on the backend.
    ///
    /// Dropping the returned future (client went away) drops the upstream
    /// call and releases its connection.
    pub async fn forward(&self, request: Request<Body>, path: PathAndQuery) -> ForwardOutcome {
        let now = Instant::now();
        let deadline = now
            .checked_add(self.target.request_timeout)
            .unwrap_or(now + FAR_FUTURE);
        let method = request.method().clone();

        let upstream = match self.build_request(request, path.clone()) {
            Ok(upstream) => upstream,
            Err(err) => {
                tracing::error!(method = %method, path = %path, error = %err.details(), "Proxy error");
                return err.into();
            }
        };

        tracing::debug!(
            method = %method,
            path = %path,
            backend = %self.target.base_url(),
            "Proxying request to backend"
        );

        let pending = self.client.request(upstream);
        let result = match time::timeout_at(
            deadline,
            time::timeout(self.target.connect_timeout, pending),
        )
        .await
        {
            Ok(Ok(Ok(response))) => Ok(response),
            Ok(Ok(Err(err))) => Err(ForwardError::Upstream(err)),
            Ok(Err(_)) => Err(ForwardError::ConnectionTimeout(self.target.connect_timeout)),
            Err(_) => Err(ForwardError::RequestTimeout(self.target.request_timeout)),
        };

        match result {
            Ok(response) => {
                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                tracing::info!(
                    method = %method,
                    path = %path,
                    status = parts.status.as_u16(),
                    "Backend responded"
                );
                let body = relay_until(Body::new(body), deadline, self.target.request_timeout);
                ForwardOutcome::Relayed(Response::from_parts(parts, body))
            }
            Err(err) => {
                tracing::error!(
                    method = %method,
                    path = %path,
                    kind = ?err.kind(),
                    error = %err.details(),
                    "Proxy error"
                );
                err.into()
            }
        }
    }

    fn build_request(
        &self,
        request: Request<Body>,
        path: PathAndQuery,
    ) -> Result<Request<Body>, ForwardError> {
        let (parts, body) = request.into_parts();

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        rewrite_host(&mut headers, self.target.host_header());

        let mut upstream = Request::builder()
            .method(parts.method)
            .uri(self.target.uri_for(path)?)
            .body(body)?;
        *upstream.headers_mut() = headers;
        Ok(upstream)
    }
}

impl std::fmt::Debug for ForwardingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardingEngine")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Method, StatusCode};

    fn engine(host: &str, port: u16) -> ForwardingEngine {
        ForwardingEngine::new(
            BackendTarget::new(host, port, Duration::from_secs(2), Duration::from_secs(2)).unwrap(),
        )
    }

    #[test]
    fn builds_backend_request() {
        let engine = engine("10.0.0.7", 3000);
        let request = Request::builder()
            .method(Method::PATCH)
            .uri("/api/tempTruck/1?force=true")
            .header(header::HOST, "proxy.example.com")
            .header(header::CONNECTION, "keep-alive")
            .header(header::AUTHORIZATION, "Bearer t")
            .body(Body::from("{}"))
            .unwrap();

        let upstream = engine
            .build_request(request, PathAndQuery::from_static("/tempTruck/1?force=true"))
            .unwrap();

        assert_eq!(upstream.method(), Method::PATCH);
        assert_eq!(
            upstream.uri().to_string(),
            "http://10.0.0.7:3000/tempTruck/1?force=true"
        );
        assert_eq!(upstream.headers()[header::HOST], "10.0.0.7:3000");
        assert_eq!(upstream.headers()[header::AUTHORIZATION], "Bearer t");
        assert!(upstream.headers().get(header::CONNECTION).is_none());
    }

    #[tokio::test]
    async fn refused_connection_is_bad_gateway() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let outcome = engine("127.0.0.1", port)
            .forward(
                Request::builder().uri("/api/x").body(Body::empty()).unwrap(),
                PathAndQuery::from_static("/x"),
            )
            .await;
        assert_eq!(outcome.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn oversized_budget_still_yields_one_outcome() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let target = BackendTarget::new(
            "127.0.0.1",
            port,
            Duration::from_secs(2),
            Duration::from_secs(u64::MAX),
        )
        .unwrap();
        let outcome = ForwardingEngine::new(target)
            .forward(
                Request::builder().uri("/api/x").body(Body::empty()).unwrap(),
                PathAndQuery::from_static("/x"),
            )
            .await;
        assert_eq!(outcome.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn unresolvable_host_is_service_unavailable() {
        let outcome = engine("backend.invalid", 3000)
            .forward(
                Request::builder().uri("/api/x").body(Body::empty()).unwrap(),
                PathAndQuery::from_static("/x"),
            )
            .await;
        assert_eq!(outcome.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
