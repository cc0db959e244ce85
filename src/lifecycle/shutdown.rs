//! Shutdown coordination for the processor.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::grpc::ServerError;
use crate::processor::StreamTracker;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole milliseconds in `grace`, saturating at `u64::MAX`.
pub fn grace_millis(grace: Duration) -> u64 {
    u64::try_from(grace.as_millis()).unwrap_or(u64::MAX)
}

/// Wait up to `grace` for the server task to wind down after shutdown was
/// triggered. Streams still open when the deadline passes are abandoned.
pub async fn drain(
    server: JoinHandle<Result<(), ServerError>>,
    tracker: &StreamTracker,
    grace: Duration,
) {
    match tokio::time::timeout(grace, server).await {
        Ok(Ok(Ok(()))) => tracing::info!("All streams finished"),
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "Server stopped with error"),
        Ok(Err(e)) => tracing::error!(error = %e, "Server task failed"),
        Err(_) => tracing::warn!(
            active_streams = tracker.active_count(),
            grace_ms = grace_millis(grace),
            "Grace period elapsed, exiting with streams still open"
        ),
    }
}
