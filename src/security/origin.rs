//! Origin policy evaluation.
//!
//! # Rules (first match wins)
//! 1. No `Origin` header: allowed when `allow_missing_origin` is set
//! 2. Exact match against the allow-list (case-sensitive)
//! 3. `http://` followed by a private-network host prefix (textual, not CIDR)
//! 4. App wrapper scheme prefix (e.g. `capacitor://`)
//!
//! Anything else is denied. Evaluation is a pure function of the header value.

use std::collections::HashSet;
use std::fmt;

use crate::config::CorsConfig;

const PLAIN_HTTP: &str = "http://";

/// Why an origin was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    MissingOrigin,
    AllowList,
    PrivateNetwork,
    AppScheme,
}

/// Why an origin was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No `Origin` header and the policy requires one.
    MissingOrigin,
    /// The header is not valid visible ASCII.
    Malformed,
    /// No rule matched.
    NotAllowed,
}

/// Outcome of [`OriginPolicy::authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(AllowReason),
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Allow(AllowReason::MissingOrigin) => "allow_missing",
            Decision::Allow(AllowReason::AllowList) => "allow_list",
            Decision::Allow(AllowReason::PrivateNetwork) => "allow_private_network",
            Decision::Allow(AllowReason::AppScheme) => "allow_app_scheme",
            Decision::Deny(DenyReason::MissingOrigin) => "deny_missing",
            Decision::Deny(DenyReason::Malformed) => "deny_malformed",
            Decision::Deny(DenyReason::NotAllowed) => "deny_not_allowed",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable set of origin rules built once at startup.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed_origins: HashSet<String>,
    private_network_prefixes: Vec<String>,
    app_schemes: Vec<String>,
    allow_missing: bool,
}

impl OriginPolicy {
    pub fn new(
        allowed_origins: impl IntoIterator<Item = String>,
        private_network_prefixes: Vec<String>,
        app_schemes: Vec<String>,
        allow_missing: bool,
    ) -> Self {
        Self {
            allowed_origins: allowed_origins.into_iter().collect(),
            private_network_prefixes,
            app_schemes,
            allow_missing,
        }
    }

    pub fn from_config(config: &CorsConfig) -> Self {
        Self::new(
            config.allowed_origins.iter().cloned(),
            config.private_network_prefixes.clone(),
            config.app_schemes.clone(),
            config.allow_missing_origin,
        )
    }

    /// Decide whether `origin` may use the proxy.
    pub fn authorize(&self, origin: Option<&str>) -> Decision {
        let Some(origin) = origin else {
            return if self.allow_missing {
                Decision::Allow(AllowReason::MissingOrigin)
            } else {
                Decision::Deny(DenyReason::MissingOrigin)
            };
        };

        if self.allowed_origins.contains(origin) {
            return Decision::Allow(AllowReason::AllowList);
        }

        if let Some(host) = origin.strip_prefix(PLAIN_HTTP) {
            if self
                .private_network_prefixes
                .iter()
                .any(|prefix| host.starts_with(prefix.as_str()))
            {
                return Decision::Allow(AllowReason::PrivateNetwork);
            }
        }

        if self
            .app_schemes
            .iter()
            .any(|scheme| origin.starts_with(scheme.as_str()))
        {
            return Decision::Allow(AllowReason::AppScheme);
        }

        Decision::Deny(DenyReason::NotAllowed)
    }
}

impl Default for OriginPolicy {
    fn default() -> Self {
        Self::from_config(&CorsConfig::default())
    }
}
