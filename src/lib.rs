//! Envoy external processor that logs traffic and inspects JSON bodies.

pub mod config;
pub mod grpc;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod processor;
pub mod proto;

pub use config::ServerConfig;
pub use grpc::GrpcServer;
pub use lifecycle::Shutdown;
