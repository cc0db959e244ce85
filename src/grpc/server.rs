//! gRPC server setup.
//!
//! # Responsibilities
//! - Register the ext_proc and health services
//! - Apply the per-connection stream limit
//! - Wire up request tracing
//! - Stop accepting on shutdown

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::grpc::ext_proc::ExtProcService;
use crate::grpc::health::HealthService;
use crate::processor::StreamTracker;
use crate::proto::ext_proc::external_processor_server::ExternalProcessorServer;
use crate::proto::health::health_server::HealthServer;

/// Error type for server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

/// gRPC server hosting the external processor.
pub struct GrpcServer {
    config: ServerConfig,
    tracker: StreamTracker,
}

impl GrpcServer {
    /// Create a new server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            tracker: StreamTracker::new(),
        }
    }

    /// Handle on the active stream count, valid after `run` takes the server.
    pub fn tracker(&self) -> StreamTracker {
        self.tracker.clone()
    }

    /// Serve on `listener` until `shutdown` fires and open connections close.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_concurrent_streams = self.config.listener.max_concurrent_streams,
            "Starting gRPC server"
        );

        let ext_proc = ExternalProcessorServer::new(ExtProcService::new(self.tracker.clone()));
        let health = HealthServer::new(HealthService);

        Server::builder()
            .max_concurrent_streams(self.config.listener.max_concurrent_streams)
            .layer(TraceLayer::new_for_grpc())
            .add_service(ext_proc)
            .add_service(health)
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, no longer accepting streams");
            })
            .await?;

        tracing::info!("gRPC server stopped");
        Ok(())
    }
}
