//! Lifecycle events received from the proxy and the replies sent back.
//!
//! These are the processor's own types. The wire messages in
//! [`crate::proto`] are converted at the transport boundary so the
//! dispatcher can match exhaustively on a closed set of phases.

use std::fmt;

use bytes::Bytes;

use crate::proto::base::HeaderValue;
use crate::proto::ext_proc::{
    processing_request, processing_response, BodyResponse, HeadersResponse, HttpBody,
    HttpHeaders, ProcessingRequest, ProcessingResponse,
};
use crate::proto::filter::processing_mode::{BodySendMode, HeaderSendMode};
use crate::proto::filter::ProcessingMode;

/// Point in an HTTP transaction a lifecycle event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    RequestHeaders,
    RequestBody,
    ResponseHeaders,
    ResponseBody,
}

impl Phase {
    /// Stable label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::RequestHeaders => "request_headers",
            Phase::RequestBody => "request_body",
            Phase::ResponseHeaders => "response_headers",
            Phase::ResponseBody => "response_body",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which half of the transaction an inspection is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Request => f.write_str("request"),
            Direction::Response => f.write_str("response"),
        }
    }
}

/// A single header as it appeared on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPair {
    pub key: String,
    pub value: String,
}

impl HeaderPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl From<HeaderValue> for HeaderPair {
    fn from(header: HeaderValue) -> Self {
        // Newer proxies may populate only `raw_value`.
        let value = if header.value.is_empty() && !header.raw_value.is_empty() {
            String::from_utf8_lossy(&header.raw_value).into_owned()
        } else {
            header.value
        };
        Self {
            key: header.key,
            value,
        }
    }
}

/// One event received on an ext_proc stream.
///
/// Header variants keep every pair in wire order, duplicates included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    RequestHeaders(Vec<HeaderPair>),
    RequestBody { body: Bytes, end_of_stream: bool },
    ResponseHeaders(Vec<HeaderPair>),
    ResponseBody { body: Bytes, end_of_stream: bool },
    /// A message with no phase this processor handles (trailers, or an
    /// empty `request` oneof). Carries a short description for logging.
    Unrecognized(&'static str),
}

impl LifecycleEvent {
    /// The phase this event belongs to, if it has one.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            LifecycleEvent::RequestHeaders(_) => Some(Phase::RequestHeaders),
            LifecycleEvent::RequestBody { .. } => Some(Phase::RequestBody),
            LifecycleEvent::ResponseHeaders(_) => Some(Phase::ResponseHeaders),
            LifecycleEvent::ResponseBody { .. } => Some(Phase::ResponseBody),
            LifecycleEvent::Unrecognized(_) => None,
        }
    }
}

fn header_pairs(headers: HttpHeaders) -> Vec<HeaderPair> {
    headers
        .headers
        .map(|map| map.headers.into_iter().map(HeaderPair::from).collect())
        .unwrap_or_default()
}

fn body_parts(body: HttpBody) -> (Bytes, bool) {
    (Bytes::from(body.body), body.end_of_stream)
}

impl From<ProcessingRequest> for LifecycleEvent {
    fn from(request: ProcessingRequest) -> Self {
        use processing_request::Request;

        match request.request {
            Some(Request::RequestHeaders(headers)) => {
                LifecycleEvent::RequestHeaders(header_pairs(headers))
            }
            Some(Request::ResponseHeaders(headers)) => {
                LifecycleEvent::ResponseHeaders(header_pairs(headers))
            }
            Some(Request::RequestBody(body)) => {
                let (body, end_of_stream) = body_parts(body);
                LifecycleEvent::RequestBody { body, end_of_stream }
            }
            Some(Request::ResponseBody(body)) => {
                let (body, end_of_stream) = body_parts(body);
                LifecycleEvent::ResponseBody { body, end_of_stream }
            }
            Some(Request::RequestTrailers(_)) => LifecycleEvent::Unrecognized("request_trailers"),
            Some(Request::ResponseTrailers(_)) => LifecycleEvent::Unrecognized("response_trailers"),
            None => LifecycleEvent::Unrecognized("empty"),
        }
    }
}

/// How the proxy should forward response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// Unset; the proxy keeps its configured behavior.
    Default,
    Send,
    Skip,
}

impl HeaderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderMode::Default => "default",
            HeaderMode::Send => "send",
            HeaderMode::Skip => "skip",
        }
    }
}

impl From<HeaderMode> for HeaderSendMode {
    fn from(mode: HeaderMode) -> Self {
        match mode {
            HeaderMode::Default => HeaderSendMode::Default,
            HeaderMode::Send => HeaderSendMode::Send,
            HeaderMode::Skip => HeaderSendMode::Skip,
        }
    }
}

/// How the proxy should forward the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    None,
    Streamed,
    Buffered,
}

impl BodyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyMode::None => "none",
            BodyMode::Streamed => "streamed",
            BodyMode::Buffered => "buffered",
        }
    }
}

impl From<BodyMode> for BodySendMode {
    fn from(mode: BodyMode) -> Self {
        match mode {
            BodyMode::None => BodySendMode::None,
            BodyMode::Streamed => BodySendMode::Streamed,
            BodyMode::Buffered => BodySendMode::Buffered,
        }
    }
}

/// Instruction for the proxy about the response phases of the current
/// transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeOverride {
    pub header_mode: HeaderMode,
    pub body_mode: BodyMode,
}

impl ModeOverride {
    /// Send response headers and deliver the whole response body at once.
    pub const FORWARD_BUFFERED: ModeOverride = ModeOverride {
        header_mode: HeaderMode::Send,
        body_mode: BodyMode::Buffered,
    };

    /// Do not send the response phases for inspection at all.
    pub const SKIP_RESPONSE: ModeOverride = ModeOverride {
        header_mode: HeaderMode::Skip,
        body_mode: BodyMode::None,
    };
}

impl From<ModeOverride> for ProcessingMode {
    fn from(mode: ModeOverride) -> Self {
        let mut processing_mode = ProcessingMode::default();
        processing_mode.set_response_header_mode(mode.header_mode.into());
        processing_mode.set_response_body_mode(mode.body_mode.into());
        processing_mode
    }
}

/// The answer to exactly one [`LifecycleEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingReply {
    pub phase: Phase,
    pub mode_override: Option<ModeOverride>,
}

impl ProcessingReply {
    /// An acknowledgment of `phase` that leaves the proxy's behavior unchanged.
    pub fn empty(phase: Phase) -> Self {
        Self {
            phase,
            mode_override: None,
        }
    }

    pub fn with_override(mut self, mode_override: Option<ModeOverride>) -> Self {
        self.mode_override = mode_override;
        self
    }
}

impl From<ProcessingReply> for ProcessingResponse {
    fn from(reply: ProcessingReply) -> Self {
        use processing_response::Response;

        let response = match reply.phase {
            Phase::RequestHeaders => Response::RequestHeaders(HeadersResponse::default()),
            Phase::ResponseHeaders => Response::ResponseHeaders(HeadersResponse::default()),
            Phase::RequestBody => Response::RequestBody(BodyResponse::default()),
            Phase::ResponseBody => Response::ResponseBody(BodyResponse::default()),
        };
        ProcessingResponse {
            response: Some(response),
            mode_override: reply.mode_override.map(ProcessingMode::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::base::HeaderMap;

    fn header(key: &str, value: &str) -> HeaderValue {
        HeaderValue {
            key: key.into(),
            value: value.into(),
            raw_value: Vec::new(),
        }
    }

    #[test]
    fn request_headers_keep_wire_order_and_duplicates() {
        let request = ProcessingRequest {
            async_mode: false,
            request: Some(processing_request::Request::RequestHeaders(HttpHeaders {
                headers: Some(HeaderMap {
                    headers: vec![
                        header("host", "example.com"),
                        header("accept", "text/html"),
                        header("accept", "application/json"),
                    ],
                }),
                end_of_stream: false,
            })),
        };

        let event = LifecycleEvent::from(request);
        assert_eq!(
            event,
            LifecycleEvent::RequestHeaders(vec![
                HeaderPair::new("host", "example.com"),
                HeaderPair::new("accept", "text/html"),
                HeaderPair::new("accept", "application/json"),
            ])
        );
    }

    #[test]
    fn raw_value_used_when_value_missing() {
        let pair = HeaderPair::from(HeaderValue {
            key: "x-raw".into(),
            value: String::new(),
            raw_value: b"bytes".to_vec(),
        });
        assert_eq!(pair, HeaderPair::new("x-raw", "bytes"));
    }

    #[test]
    fn trailers_and_empty_requests_are_unrecognized() {
        let empty = ProcessingRequest::default();
        assert_eq!(LifecycleEvent::from(empty).phase(), None);

        let trailers = ProcessingRequest {
            async_mode: false,
            request: Some(processing_request::Request::ResponseTrailers(Default::default())),
        };
        assert_eq!(
            LifecycleEvent::from(trailers),
            LifecycleEvent::Unrecognized("response_trailers")
        );
    }

    #[test]
    fn body_event_carries_flag_and_payload() {
        let request = ProcessingRequest {
            async_mode: false,
            request: Some(processing_request::Request::ResponseBody(HttpBody {
                body: b"{\"ok\":true}".to_vec(),
                end_of_stream: true,
            })),
        };
        match LifecycleEvent::from(request) {
            LifecycleEvent::ResponseBody { body, end_of_stream } => {
                assert_eq!(&body[..], b"{\"ok\":true}");
                assert!(end_of_stream);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn reply_variant_matches_phase() {
        use processing_response::Response;

        let cases = [
            (Phase::RequestHeaders, "request_headers"),
            (Phase::RequestBody, "request_body"),
            (Phase::ResponseHeaders, "response_headers"),
            (Phase::ResponseBody, "response_body"),
        ];
        for (phase, label) in cases {
            let response = ProcessingResponse::from(ProcessingReply::empty(phase));
            let matched = match response.response {
                Some(Response::RequestHeaders(_)) => "request_headers",
                Some(Response::RequestBody(_)) => "request_body",
                Some(Response::ResponseHeaders(_)) => "response_headers",
                Some(Response::ResponseBody(_)) => "response_body",
                _ => "other",
            };
            assert_eq!(matched, label);
            assert!(response.mode_override.is_none());
        }
    }

    #[test]
    fn mode_override_sets_response_modes_only() {
        let mode = ProcessingMode::from(ModeOverride::FORWARD_BUFFERED);
        assert_eq!(mode.response_header_mode(), HeaderSendMode::Send);
        assert_eq!(mode.response_body_mode(), BodySendMode::Buffered);
        assert_eq!(mode.request_header_mode(), HeaderSendMode::Default);
        assert_eq!(mode.request_body_mode(), BodySendMode::None);

        let mode = ProcessingMode::from(ModeOverride::SKIP_RESPONSE);
        assert_eq!(mode.response_header_mode(), HeaderSendMode::Skip);
        assert_eq!(mode.response_body_mode(), BodySendMode::None);
    }
}
