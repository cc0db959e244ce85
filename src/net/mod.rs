//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured port
//!     → listener.rs (resolve address, bind)
//!     → Hand off to the gRPC server
//! ```

pub mod listener;

pub use listener::{bind, ListenerError};
