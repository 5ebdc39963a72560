//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Published path prefix and its rewrite.
    pub route: RouteConfig,

    /// The single upstream server.
    pub backend: BackendConfig,

    /// Origin policy and CORS response headers.
    pub cors: CorsConfig,

    /// Upstream timeout budgets.
    pub timeouts: TimeoutConfig,

    /// Startup connectivity probe.
    pub probe: ProbeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Listening port. Overridden by `PORT`.
    pub port: u16,

    /// Path of the liveness endpoint.
    pub health_path: String,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            health_path: "/health".to_string(),
        }
    }
}

/// Route configuration: requests under `path_prefix` are forwarded with the
/// prefix stripped.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Externally visible prefix, e.g. "/api".
    pub path_prefix: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            path_prefix: "/api".to_string(),
        }
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend host name or IP address.
    pub host: String,

    /// Backend port.
    pub port: u16,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "20.214.33.209".to_string(),
            port: 3000,
        }
    }
}

/// Origin policy and the CORS headers granted to allowed origins.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Exact origins (scheme + host + port), compared case-sensitively.
    pub allowed_origins: Vec<String>,

    /// Host prefixes accepted for plain `http://` origins (local network
    /// development). Textual prefix test, not a CIDR match.
    pub private_network_prefixes: Vec<String>,

    /// Scheme prefixes of mobile app wrappers, e.g. "capacitor://".
    pub app_schemes: Vec<String>,

    /// Allow requests that carry no `Origin` header (non-browser clients).
    pub allow_missing_origin: bool,

    /// Methods advertised in `Access-Control-Allow-Methods`.
    pub allowed_methods: Vec<String>,

    /// Headers advertised in `Access-Control-Allow-Headers`.
    pub allowed_headers: Vec<String>,

    /// Send `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,

    /// Preflight cache lifetime (`Access-Control-Max-Age`), if any.
    pub max_age_secs: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "https://gyeongwon-environment-web-and-app.github.io".to_string(),
            ],
            private_network_prefixes: vec![
                "192.168.".to_string(),
                "10.".to_string(),
                "172.".to_string(),
            ],
            app_schemes: vec!["capacitor://".to_string()],
            allow_missing_origin: true,
            allowed_methods: ["GET", "POST", "PUT", "PATCH", "DELETE"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_headers: [
                "Origin",
                "X-Requested-With",
                "Content-Type",
                "Accept",
                "Authorization",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            allow_credentials: true,
            max_age_secs: None,
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection-level budget: connect plus waiting for response headers.
    pub connect_secs: u64,

    /// Request-level budget: the whole proxied round trip, body included.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 60,
            request_secs: 60,
        }
    }
}

/// Startup connectivity probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Run the probe when the server starts.
    pub enabled: bool,

    /// Probe timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
