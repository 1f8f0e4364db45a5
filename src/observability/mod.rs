//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//! ```
//!
//! # Design Decisions
//! - Structured fields (method, path, status, peer) on every exchange log
//! - Metrics are cheap (facade calls, no-op without an exporter)

pub mod logging;
pub mod metrics;
