//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Authorized request + rewritten path
//!     → engine.rs (build backend request, dispatch, enforce budgets)
//!         → resolver.rs (DNS; failure = never dispatched)
//!         → target.rs (backend authority, timeouts)
//!     → error.rs (classify failure by stage)
//!     → outcome.rs (Relayed | GatewayError | ServiceUnavailable)
//!     → body.rs (deadline-bounded streaming of the relayed body)
//! ```
//!
//! # Design Decisions
//! - No retries: one attempt, one terminal response
//! - Request and response bodies are streamed, never buffered
//! - Failures after the response is committed abort the stream

pub mod body;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod resolver;
pub mod target;

pub use engine::ForwardingEngine;
pub use error::{FailureKind, ForwardError};
pub use outcome::ForwardOutcome;
pub use target::BackendTarget;
