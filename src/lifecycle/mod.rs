//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Wait grace period → Exit
//! ```
//!
//! # Design Decisions
//! - Shutdown never cancels in-flight streams directly; they get the grace period
//! - Shutdown has timeout: forced exit after deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::{drain, grace_millis, Shutdown};
pub use signals::{wait_for_shutdown_signal, ShutdownSignal};
