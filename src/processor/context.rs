//! Per-stream identity, cancellation and lifetime tracking.
//!
//! # Responsibilities
//! - Generate unique stream IDs for tracing
//! - Carry the stream's cancellation signal into the session loop
//! - Count active streams so shutdown can report what is still in flight

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::observability::metrics;

/// Global atomic counter for stream IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static STREAM_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an ext_proc stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(u64);

impl StreamId {
    /// Generate a new unique stream ID.
    pub fn new() -> Self {
        Self(STREAM_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for StreamId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stream-{}", self.0)
    }
}

/// Cancellation view handed to the session loop.
#[derive(Debug, Clone)]
pub struct StreamContext {
    cancelled: watch::Receiver<bool>,
}

impl StreamContext {
    /// Create a context together with the handle that cancels it.
    ///
    /// Dropping the handle cancels the context.
    pub fn new() -> (Self, CancelOnDrop) {
        let (tx, rx) = watch::channel(false);
        (Self { cancelled: rx }, CancelOnDrop { tx })
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolve once the context is cancelled.
    pub async fn cancelled(&mut self) {
        let closed = self.cancelled.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            // The handle always flags cancellation before it goes away, so a
            // closed channel without the flag never resolves.
            std::future::pending::<()>().await;
        }
    }
}

/// Owner side of a [`StreamContext`]. Cancels on [`cancel`](Self::cancel) or drop.
#[derive(Debug)]
pub struct CancelOnDrop {
    tx: watch::Sender<bool>,
}

impl CancelOnDrop {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Tracks active streams for shutdown reporting.
#[derive(Debug, Clone, Default)]
pub struct StreamTracker {
    /// Current count of active streams.
    active_count: Arc<AtomicU64>,
}

impl StreamTracker {
    /// Create a new stream tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active stream. Returns a guard that decrements on drop.
    pub fn track(&self) -> StreamGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        metrics::stream_opened();
        StreamGuard {
            active_count: Arc::clone(&self.active_count),
            id: StreamId::new(),
        }
    }

    /// Get current active stream count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Guard that tracks a stream's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct StreamGuard {
    active_count: Arc<AtomicU64>,
    id: StreamId,
}

impl StreamGuard {
    /// Get this stream's ID.
    pub fn id(&self) -> StreamId {
        self.id
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        metrics::stream_closed();
        tracing::trace!(stream_id = %self.id, "Stream closed");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn stream_id_unique() {
        let id1 = StreamId::new();
        let id2 = StreamId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("stream-"));
    }

    #[test]
    fn stream_tracker_counts() {
        let tracker = StreamTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track();
        assert_eq!(tracker.active_count(), 1);

        let guard2 = tracker.track();
        assert_eq!(tracker.active_count(), 2);
        assert_ne!(guard1.id(), guard2.id());

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn explicit_cancel_is_visible() {
        let (context, handle) = StreamContext::new();
        assert!(!context.is_cancelled());
        handle.cancel();
        assert!(context.is_cancelled());
    }

    #[tokio::test]
    async fn dropping_handle_wakes_waiter() {
        let (mut context, handle) = StreamContext::new();
        let waiter = tokio::spawn(async move {
            context.cancelled().await;
            context.is_cancelled()
        });

        drop(handle);
        let cancelled = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter resolves")
            .unwrap();
        assert!(cancelled);
    }
}
