//! Phase dispatch.

use super::body::inspect_body;
use super::event::{Direction, LifecycleEvent, Phase, ProcessingReply};
use super::headers::inspect_headers;

/// Route one event to its inspector and build the reply for it.
///
/// The reply always carries the event's phase. Events without a phase are
/// answered with an empty `RequestHeaders` reply so the stream stays open.
pub fn dispatch(event: &LifecycleEvent) -> ProcessingReply {
    match event {
        LifecycleEvent::RequestHeaders(headers) => {
            inspect_headers(Direction::Request, headers);
            ProcessingReply::empty(Phase::RequestHeaders)
        }
        LifecycleEvent::ResponseHeaders(headers) => {
            inspect_headers(Direction::Response, headers);
            ProcessingReply::empty(Phase::ResponseHeaders)
        }
        LifecycleEvent::RequestBody {
            body,
            end_of_stream: true,
        } => ProcessingReply::empty(Phase::RequestBody)
            .with_override(inspect_body(body, Direction::Request)),
        LifecycleEvent::RequestBody { .. } => ProcessingReply::empty(Phase::RequestBody),
        LifecycleEvent::ResponseBody {
            body,
            end_of_stream,
        } => {
            if *end_of_stream {
                inspect_body(body, Direction::Response);
            }
            ProcessingReply::empty(Phase::ResponseBody)
        }
        LifecycleEvent::Unrecognized(kind) => {
            tracing::warn!(kind = *kind, "Unknown request type");
            ProcessingReply::empty(Phase::RequestHeaders)
        }
    }
}
