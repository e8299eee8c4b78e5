//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream fetch:
//!     → timeouts.rs (one deadline around the whole fetch, token exchange included)
//!     → retries.rs (at most two attempts, retryable failures only)
//!     → backoff.rs (jittered delay between attempts)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - Retries stay inside the client and are capped at two attempts;
//!   anything beyond that is the caller's decision
//! - Timeouts are not retried: the deadline covers all attempts

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{is_retryable, RetryPolicy, MAX_UPSTREAM_ATTEMPTS};
pub use timeouts::with_deadline;
