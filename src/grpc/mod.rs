//! gRPC protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (tonic setup, stream limit, tracing layer)
//!     → ext_proc.rs (one session task per Process stream)
//!     → health.rs (liveness probe)
//! ```

pub mod ext_proc;
pub mod health;
pub mod server;

pub use ext_proc::{ExtProcService, ReplyStream};
pub use health::HealthService;
pub use server::{GrpcServer, ServerError};
