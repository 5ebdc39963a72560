//! Backend name resolution.
//!
//! Wraps tokio's resolver so a lookup failure surfaces in the client error
//! chain as a distinct [`ResolveError`]. That is what lets the engine tell
//! "never dispatched" apart from "dispatched and failed".

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use hyper_util::client::legacy::connect::dns::Name;
use thiserror::Error;
use tower::Service;

/// The backend host name could not be resolved.
#[derive(Debug, Error)]
#[error("failed to resolve `{host}`: {source}")]
pub struct ResolveError {
    host: String,
    #[source]
    source: io::Error,
}

impl ResolveError {
    pub fn host(&self) -> &str {
        &self.host
    }
}

/// DNS resolver for the upstream connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendResolver;

impl Service<Name> for BackendResolver {
    type Response = std::vec::IntoIter<SocketAddr>;
    type Error = ResolveError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, name: Name) -> Self::Future {
        let host = name.as_str().to_string();
        Box::pin(async move {
            // Port 0: the connector fills in the real port.
            let addrs: Vec<SocketAddr> = match tokio::net::lookup_host((host.clone(), 0)).await {
                Ok(addrs) => addrs.collect(),
                Err(source) => return Err(ResolveError { host, source }),
            };
            if addrs.is_empty() {
                return Err(ResolveError {
                    host,
                    source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
                });
            }
            tracing::trace!(host = %host, count = addrs.len(), "Backend resolved");
            Ok(addrs.into_iter())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tower::ServiceExt;

    #[tokio::test]
    async fn resolves_ip_literal() {
        let addrs: Vec<_> = BackendResolver
            .oneshot(Name::from_str("127.0.0.1").unwrap())
            .await
            .unwrap()
            .collect();
        assert_eq!(addrs, vec!["127.0.0.1:0".parse::<SocketAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn unknown_host_fails() {
        let err = BackendResolver
            .oneshot(Name::from_str("backend.invalid").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.host(), "backend.invalid");
    }
}
