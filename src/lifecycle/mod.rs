//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build server → Bind listener → Serve
//!     (backend probe runs alongside, never gating)
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fatal only on bad config or a port that cannot be bound
//! - Backend unreachability is never fatal

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
