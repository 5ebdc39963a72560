//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request path
//!     → route.rs (prefix match on a segment boundary)
//!     → Return: backend path-and-query, or no match (404)
//! ```
//!
//! # Design Decisions
//! - One route, built at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always rewrites to the same path

pub mod route;

pub use route::ProxyRoute;
