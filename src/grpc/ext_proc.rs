//! `ExternalProcessor` gRPC service.
//!
//! Each `Process` call gets its own task running the session loop. The
//! inbound half is the tonic `Streaming` of requests; the outbound half is an
//! mpsc channel drained by tonic as the response stream. When tonic drops the
//! response stream (peer gone, RPC torn down) the stream context is
//! cancelled.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tonic::{Request, Response, Status, Streaming};
use tracing::Instrument;

use crate::observability::metrics;
use crate::processor::{
    run_session, CancelOnDrop, ChannelError, EventChannel, LifecycleEvent, ProcessingReply,
    SessionOutcome, StreamContext, StreamTracker,
};
use crate::proto::ext_proc::external_processor_server::ExternalProcessor;
use crate::proto::ext_proc::{ProcessingRequest, ProcessingResponse};

/// Replies buffered between the session task and tonic.
const REPLY_BUFFER: usize = 4;

type ReplyResult = Result<ProcessingResponse, Status>;

/// The ext_proc service. Holds no per-stream state.
#[derive(Debug, Clone)]
pub struct ExtProcService {
    tracker: StreamTracker,
}

impl ExtProcService {
    pub fn new(tracker: StreamTracker) -> Self {
        Self { tracker }
    }
}

#[tonic::async_trait]
impl ExternalProcessor for ExtProcService {
    type ProcessStream = ReplyStream;

    async fn process(
        &self,
        request: Request<Streaming<ProcessingRequest>>,
    ) -> Result<Response<Self::ProcessStream>, Status> {
        let remote_addr = request.remote_addr();
        let inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(REPLY_BUFFER);
        let (mut context, cancel) = StreamContext::new();

        let guard = self.tracker.track();
        let span = tracing::info_span!("ext_proc", stream_id = %guard.id());

        tokio::spawn(
            async move {
                tracing::debug!(remote_addr = ?remote_addr, "Stream opened");

                let mut channel = GrpcChannel {
                    inbound,
                    outbound: tx,
                };
                let outcome = run_session(&mut channel, &mut context).await;

                metrics::record_stream_finished(outcome.as_str());
                match &outcome {
                    SessionOutcome::ReceiveFailed(e) => {
                        tracing::warn!(error = %e, "Stream ended on receive error")
                    }
                    other => tracing::debug!(outcome = other.as_str(), "Stream ended"),
                }

                if let Err(status) = outcome.into_result() {
                    // The peer may already be gone; nothing else to do then.
                    let _ = channel.outbound.send(Err(status)).await;
                }
                drop(guard);
            }
            .instrument(span),
        );

        Ok(Response::new(ReplyStream::new(rx, cancel)))
    }
}

/// Session channel over a tonic bidirectional stream.
struct GrpcChannel {
    inbound: Streaming<ProcessingRequest>,
    outbound: mpsc::Sender<ReplyResult>,
}

impl EventChannel for GrpcChannel {
    async fn recv(&mut self) -> Result<Option<LifecycleEvent>, ChannelError> {
        match self.inbound.message().await {
            Ok(Some(request)) => Ok(Some(LifecycleEvent::from(request))),
            Ok(None) => Ok(None),
            Err(status) => Err(ChannelError::Transport(status.to_string())),
        }
    }

    async fn send(&mut self, reply: ProcessingReply) -> Result<(), ChannelError> {
        self.outbound
            .send(Ok(ProcessingResponse::from(reply)))
            .await
            .map_err(|_| ChannelError::Closed)
    }
}

/// Response stream handed to tonic. Dropping it cancels the stream context.
pub struct ReplyStream {
    inner: ReceiverStream<ReplyResult>,
    _cancel: CancelOnDrop,
}

impl ReplyStream {
    fn new(rx: mpsc::Receiver<ReplyResult>, cancel: CancelOnDrop) -> Self {
        Self {
            inner: ReceiverStream::new(rx),
            _cancel: cancel,
        }
    }
}

impl Stream for ReplyStream {
    type Item = ReplyResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
