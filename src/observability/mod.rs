//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (invocation counters and latency histograms)
//!
//! Consumers:
//!     → stdout (fmt layer, filter from RUST_LOG)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - One log line per registered binding and per request outcome
//! - Request ID flows from the HTTP layer into the handler process
//! - Metrics are recorded through the `metrics` facade and cost nothing
//!   when no exporter is installed

pub mod logging;
pub mod metrics;
