//! Backend target.
//!
//! # Responsibilities
//! - Represent the single upstream server
//! - Pre-compute its authority and base URL
//! - Carry the connection-level and request-level timeout budgets

use std::time::Duration;

use axum::http::{
    header::InvalidHeaderValue,
    uri::{Authority, InvalidUri, PathAndQuery, Scheme, Uri},
    HeaderValue,
};
use thiserror::Error;
use url::Url;

use crate::config::{BackendConfig, TimeoutConfig};

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("invalid backend authority `{authority}`: {source}")]
    Authority {
        authority: String,
        #[source]
        source: InvalidUri,
    },

    #[error("invalid backend base URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("backend authority is not a valid Host header: {0}")]
    Host(#[from] InvalidHeaderValue),
}

/// The upstream server every request is forwarded to.
#[derive(Debug, Clone)]
pub struct BackendTarget {
    host: String,
    port: u16,
    authority: Authority,
    host_header: HeaderValue,
    /// Pre-calculated base URL for logging.
    base_url: Url,
    /// Connect plus waiting for response headers.
    pub connect_timeout: Duration,
    /// Whole proxied round trip, response body included.
    pub request_timeout: Duration,
}

impl BackendTarget {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, TargetError> {
        let host = host.into();
        let raw = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        };
        let authority = raw.parse::<Authority>().map_err(|source| TargetError::Authority {
            authority: raw.clone(),
            source,
        })?;
        let base_url = Url::parse(&format!("http://{authority}"))?;
        let host_header = HeaderValue::from_str(authority.as_str())?;

        Ok(Self {
            host,
            port,
            authority,
            host_header,
            base_url,
            connect_timeout,
            request_timeout,
        })
    }

    pub fn from_config(backend: &BackendConfig, timeouts: &TimeoutConfig) -> Result<Self, TargetError> {
        Self::new(
            backend.host.clone(),
            backend.port,
            Duration::from_secs(timeouts.connect_secs),
            Duration::from_secs(timeouts.request_secs),
        )
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Value sent as `Host` on forwarded requests.
    pub fn host_header(&self) -> &HeaderValue {
        &self.host_header
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URI for `path` on this backend.
    pub fn uri_for(&self, path: PathAndQuery) -> Result<Uri, axum::http::Error> {
        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path)
            .build()
    }
}
