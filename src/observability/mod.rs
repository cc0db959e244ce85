//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Session loop and inspectors produce:
//!     → logging.rs (structured log events, one span per stream)
//!     → metrics.rs (event, override and stream counters)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Inspected headers and bodies are written as log lines, never stored
//! - Stream ID flows through every log line of a stream via its span
//! - Metrics are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
