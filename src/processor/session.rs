//! Stream session loop.
//!
//! One session owns one ext_proc stream: receive an event, dispatch it, send
//! the reply, repeat until the proxy closes its side, the transport fails, or
//! the stream is cancelled. Nothing is carried from one event to the next.

use std::future::Future;

use super::context::StreamContext;
use super::dispatch::dispatch;
use super::event::{LifecycleEvent, ProcessingReply};
use crate::observability::metrics;

/// Error raised by an [`EventChannel`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The transport failed while receiving or sending.
    #[error("{0}")]
    Transport(String),
    /// The peer is no longer reading replies.
    #[error("reply channel closed")]
    Closed,
}

/// Bidirectional event channel bound to one stream.
pub trait EventChannel: Send {
    /// Receive the next event. `Ok(None)` marks the end of input.
    fn recv(&mut self) -> impl Future<Output = Result<Option<LifecycleEvent>, ChannelError>> + Send;

    /// Send the reply for the most recently received event.
    fn send(&mut self, reply: ProcessingReply) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The proxy closed its side of the stream.
    Completed,
    /// The stream context was cancelled.
    Cancelled,
    /// Receiving failed; the stream is torn down.
    ReceiveFailed(ChannelError),
}

impl SessionOutcome {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionOutcome::Completed => "completed",
            SessionOutcome::Cancelled => "cancelled",
            SessionOutcome::ReceiveFailed(_) => "receive_failed",
        }
    }

    /// Map the outcome onto the gRPC status the stream ends with.
    pub fn into_result(self) -> Result<(), tonic::Status> {
        match self {
            SessionOutcome::Completed => Ok(()),
            SessionOutcome::Cancelled => Err(tonic::Status::cancelled("context canceled")),
            SessionOutcome::ReceiveFailed(e) => Err(tonic::Status::unknown(format!(
                "cannot receive stream request: {}",
                e
            ))),
        }
    }
}

/// Drive one stream until it ends.
///
/// Every received event gets exactly one reply, in receive order. A failed
/// send is logged and the loop keeps receiving.
pub async fn run_session<C: EventChannel>(
    channel: &mut C,
    context: &mut StreamContext,
) -> SessionOutcome {
    loop {
        if context.is_cancelled() {
            return SessionOutcome::Cancelled;
        }

        let received = tokio::select! {
            biased;
            _ = context.cancelled() => return SessionOutcome::Cancelled,
            received = channel.recv() => received,
        };

        let event = match received {
            Ok(Some(event)) => event,
            Ok(None) => return SessionOutcome::Completed,
            Err(e) => return SessionOutcome::ReceiveFailed(e),
        };

        metrics::record_event(event.phase());
        let reply = dispatch(&event);
        if let Some(mode_override) = &reply.mode_override {
            metrics::record_mode_override(mode_override);
        }

        if let Err(e) = channel.send(reply).await {
            tracing::warn!(phase = %reply.phase, error = %e, "send error");
            metrics::record_send_failure();
        }
    }
}
