//! TTL cache subsystem.
//!
//! # Data Flow
//! ```text
//! Feed::resolve
//!     → ttl.rs get_fresh(key)        hit → serve
//!     → (miss) upstream fetch + validation
//!     → ttl.rs put(key, value)       stamped by clock.rs
//!     → on failure: ttl.rs get(key)  any age → serve stale
//! ```
//!
//! # Design Decisions
//! - One cache instance per provider, built at startup and injected
//! - Staleness is evaluated at read time; there is no eviction task
//! - Entries are replaced by swapping an `Arc`, so readers never see a
//!   half-written value
//! - Nothing is persisted; a restart starts cold

pub mod clock;
pub mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ttl::{CacheEntry, TtlCache};
