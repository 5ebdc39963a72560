//! Response body relay.
//!
//! Once the backend's status line and headers are handed to the client the
//! response is committed. Failures after that point cannot become a 502/503;
//! the relay ends the stream with an error, hyper aborts the connection, and
//! the failure is logged.

use std::time::Duration;

use axum::body::{Body, Bytes};
use futures_util::{stream, StreamExt};
use thiserror::Error;
use tokio::time::{self, Instant};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("backend stream failed after the response was committed: {0}")]
    Stream(#[source] axum::Error),

    #[error("request budget of {0:?} ran out while relaying the body")]
    Deadline(Duration),
}

/// Relay `body`, failing the stream if `deadline` passes first.
pub fn relay_until(body: Body, deadline: Instant, budget: Duration) -> Body {
    let chunks = stream::unfold(Some(body.into_data_stream()), move |state| async move {
        let mut upstream = state?;
        match time::timeout_at(deadline, upstream.next()).await {
            Ok(Some(Ok(chunk))) => Some((Ok::<Bytes, RelayError>(chunk), Some(upstream))),
            Ok(Some(Err(err))) => {
                let err = RelayError::Stream(err);
                tracing::warn!(error = %err, "Response relay aborted");
                Some((Err(err), None))
            }
            Ok(None) => None,
            Err(_) => {
                let err = RelayError::Deadline(budget);
                tracing::warn!(error = %err, "Response relay aborted");
                Some((Err(err), None))
            }
        }
    });
    Body::from_stream(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn passes_complete_body_through() {
        let deadline = Instant::now() + Duration::from_secs(5);
        let body = relay_until(Body::from("hello backend"), deadline, Duration::from_secs(5));
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"hello backend");
    }

    #[tokio::test]
    async fn stalled_body_fails_at_deadline() {
        let stalled = Body::from_stream(stream::pending::<Result<Bytes, std::io::Error>>());
        let deadline = Instant::now() + Duration::from_millis(50);
        let body = relay_until(stalled, deadline, Duration::from_millis(50));
        assert!(to_bytes(body, usize::MAX).await.is_err());
    }

    #[tokio::test]
    async fn upstream_error_ends_stream() {
        let broken = Body::from_stream(stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ]));
        let deadline = Instant::now() + Duration::from_secs(5);
        let body = relay_until(broken, deadline, Duration::from_secs(5));
        assert!(to_bytes(body, usize::MAX).await.is_err());
    }
}
