//! ext_proc stream processing.
//!
//! # Data Flow
//! ```text
//! ProcessingRequest (wire)
//!     → event.rs (LifecycleEvent, one variant per phase)
//!     → session.rs (receive loop, cancellation, send)
//!     → dispatch.rs (route by phase)
//!         → headers.rs (log header pairs)
//!         → body.rs (JSON decode, pick response mode override)
//!     → ProcessingReply → ProcessingResponse (wire)
//! ```
//!
//! # Design Decisions
//! - Stateless: each event is answered from its own content only
//! - Phases are a closed enum, matched exhaustively
//! - Malformed bodies are an expected branch, not an error
//! - A failed send is logged and the stream keeps going

pub mod body;
pub mod context;
pub mod dispatch;
pub mod event;
pub mod headers;
pub mod session;

pub use body::{decode_body, inspect_body, DecodeError, JsonBody};
pub use context::{CancelOnDrop, StreamContext, StreamGuard, StreamId, StreamTracker};
pub use dispatch::dispatch;
pub use event::{
    BodyMode, Direction, HeaderMode, HeaderPair, LifecycleEvent, ModeOverride, Phase,
    ProcessingReply,
};
pub use headers::{header_lines, header_title, inspect_headers};
pub use session::{run_session, ChannelError, EventChannel, SessionOutcome};
