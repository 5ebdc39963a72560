//! Published route and path rewrite.
//!
//! # Responsibilities
//! - Match the request path prefix (case-sensitive, segment boundary)
//! - Strip the prefix once, keeping the rest of the path and the query
//!
//! # Design Decisions
//! - Anchored at the start of the path, never recursive
//! - An empty remainder becomes "/"
//! - The path is kept as received (no percent-decoding)

use axum::http::uri::{InvalidUri, PathAndQuery, Uri};

/// Maps `<prefix>/rest?query` onto `/rest?query` at the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    prefix: String,
}

impl ProxyRoute {
    /// Create a route for `prefix` (e.g. "/api"). A trailing '/' is ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        while prefix.len() > 1 && prefix.ends_with('/') {
            prefix.pop();
        }
        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if `path` lies under this route.
    pub fn matches(&self, path: &str) -> bool {
        self.strip(path).is_some()
    }

    /// The backend path for `uri`, or `None` when the route does not apply.
    pub fn rewrite(&self, uri: &Uri) -> Option<Result<PathAndQuery, InvalidUri>> {
        let rest = self.strip(uri.path())?;
        let path = if rest.is_empty() { "/" } else { rest };
        let rewritten = match uri.query() {
            Some(query) => format!("{path}?{query}"),
            None => path.to_string(),
        };
        Some(rewritten.parse())
    }

    fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}
