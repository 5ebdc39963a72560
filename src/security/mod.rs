//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin gate: preflight, allow/deny, grant headers)
//!         → origin.rs (pure origin policy)
//!     → Pass to routing
//!
//! Forwarded request / relayed response:
//!     → headers.rs (strip hop-by-hop, rewrite Host)
//! ```
//!
//! # Design Decisions
//! - Denied requests never reach the forwarding engine
//! - The origin check is a development convenience, not a trust boundary

pub mod cors;
pub mod headers;
pub mod origin;

pub use cors::{origin_gate, OriginGate};
pub use origin::{AllowReason, Decision, DenyReason, OriginPolicy};
