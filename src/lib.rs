//! Portfolio feeds library.
//!
//! Server-side aggregation of third-party data for a personal portfolio site:
//! fetch, validate, cache for a bounded time, and degrade gracefully.

// Core pipeline
pub mod cache;
pub mod error;
pub mod feed;
pub mod providers;
pub mod validate;

// Serving
pub mod admin;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::FeedsConfig;
pub use error::{FeedError, TransportError};
pub use feed::{Feed, FetchOutcome, Provider, ProviderId};
pub use http::{AppState, HttpServer};
pub use lifecycle::{bootstrap, Feeds, Shutdown};
