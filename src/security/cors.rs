//! Origin gate middleware.
//! Enforces the origin policy and answers CORS preflights.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{self, InvalidHeaderValue},
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::CorsConfig;
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::security::origin::{Decision, DenyReason, OriginPolicy};

/// Origin policy plus the precomputed grant headers.
#[derive(Debug, Clone)]
pub struct OriginGate {
    policy: OriginPolicy,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    allow_credentials: bool,
    max_age: Option<HeaderValue>,
    exempt_paths: Vec<String>,
}

impl OriginGate {
    pub fn from_config(config: &CorsConfig) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            policy: OriginPolicy::from_config(config),
            allow_methods: HeaderValue::from_str(&config.allowed_methods.join(", "))?,
            allow_headers: HeaderValue::from_str(&config.allowed_headers.join(", "))?,
            allow_credentials: config.allow_credentials,
            max_age: config.max_age_secs.map(HeaderValue::from),
            exempt_paths: Vec::new(),
        })
    }

    /// Never reject requests to `path` (grant headers are still only sent
    /// to allowed origins). Preflights are always gated.
    pub fn exempt(mut self, path: impl Into<String>) -> Self {
        self.exempt_paths.push(path.into());
        self
    }

    pub fn policy(&self) -> &OriginPolicy {
        &self.policy
    }

    /// Evaluate a raw `Origin` header value.
    pub fn evaluate(&self, origin: Option<&HeaderValue>) -> Decision {
        match origin.map(HeaderValue::to_str) {
            None => self.policy.authorize(None),
            Some(Ok(origin)) => self.policy.authorize(Some(origin)),
            Some(Err(_)) => Decision::Deny(DenyReason::Malformed),
        }
    }

    fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|p| p == path)
    }

    fn grant(&self, headers: &mut HeaderMap, origin: Option<&HeaderValue>, preflight: bool) {
        let Some(origin) = origin else {
            return;
        };

        // Echo the exact origin; a wildcard is not allowed with credentials.
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        if self.allow_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            self.allow_methods.clone(),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            self.allow_headers.clone(),
        );
        if !varies_on_origin(headers) {
            headers.append(header::VARY, HeaderValue::from_static("Origin"));
        }

        if preflight {
            if let Some(max_age) = &self.max_age {
                headers.insert(header::ACCESS_CONTROL_MAX_AGE, max_age.clone());
            }
        }
    }
}

/// Whether an existing `Vary` already covers `Origin` (or everything).
fn varies_on_origin(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::VARY)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|token| token == "*" || token.eq_ignore_ascii_case("origin"))
}

pub async fn origin_gate(
    State(gate): State<Arc<OriginGate>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();
    let decision = gate.evaluate(origin.as_ref());
    let preflight = request.method() == Method::OPTIONS;
    metrics::record_origin_decision(&decision);

    if !decision.is_allowed() {
        let origin_text = match &origin {
            Some(value) => value.to_str().unwrap_or("<malformed>"),
            None => "<none>",
        };
        tracing::warn!(
            origin = %origin_text,
            method = %request.method(),
            path = %request.uri().path(),
            decision = %decision,
            "Origin rejected"
        );

        if preflight || !gate.is_exempt(request.uri().path()) {
            return ApiError::forbidden_origin(format!("Not allowed by CORS: {origin_text}"))
                .into_response();
        }
        return next.run(request).await;
    }

    if preflight {
        tracing::debug!(path = %request.uri().path(), decision = %decision, "Preflight answered");
        let mut response = StatusCode::NO_CONTENT.into_response();
        gate.grant(response.headers_mut(), origin.as_ref(), true);
        return response;
    }

    let mut response = next.run(request).await;
    gate.grant(response.headers_mut(), origin.as_ref(), false);
    response
}
