//! Feed subsystem: the degradation policy wrapped around every provider.
//!
//! # Data Flow
//! ```text
//! handler → Feed::resolve(key)
//!     → cache fresh?            yes → Cached
//!     → spawn fetch_and_store   (deadline → Provider::fetch → Provider::decode → cache.put)
//!         ok                    → Fresh
//!         err → degrade(stale, fallback, error)
//!                                  stale entry    → Cached
//!                                  fallback       → Degraded
//!                                  neither        → Failed
//! ```
//!
//! # Design Decisions
//! - One generic `Feed<P>`; integrations only supply a `Provider`
//! - Transport and validation errors end here; callers only ever see an outcome
//! - The refresh runs in its own task so a cancelled request still fills the cache
//! - Concurrent misses on the same key may each fetch; there is no single-flight

pub mod policy;
pub mod provider;
pub mod resolver;

pub use policy::{degrade, FeedPolicy, FetchOutcome};
pub use provider::{CacheKey, Provider, ProviderId};
pub use resolver::{CacheSnapshot, Feed, FeedInspect, FeedStatus};
