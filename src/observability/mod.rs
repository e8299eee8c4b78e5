//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! feed, providers, http produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and histograms)
//!
//! Consumers:
//!     → stdout (log aggregation)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (`provider`, `key`, `status`, `attempt`) rather than
//!   formatted messages
//! - Request ID is generated at the edge and recorded on the request span
//! - Metrics are cheap (atomic increments) and no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
