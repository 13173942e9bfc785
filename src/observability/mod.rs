//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline and server produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (request counter and latency histogram)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the trace span, not through the pipeline
//! - Metrics are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
