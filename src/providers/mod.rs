//! Upstream provider clients.
//!
//! # Data Flow
//! ```text
//! Feed::resolve (cache miss)
//!     → <provider>.rs fetch (build request, credentials)
//!     → http.rs send_json (retry loop, status mapping, metrics)
//!     → raw serde_json::Value
//!     → <provider>.rs decode (schema validation, shaping)
//! ```
//!
//! # Design Decisions
//! - All providers share one pooled HTTP client
//! - Each provider declares its payload schema next to its client
//! - Providers never cache; caching belongs to `Feed`

pub mod github;
pub mod http;
pub mod lanyard;
pub mod sanity;
pub mod spotify;
pub mod stripe;
pub mod umami;

pub use github::{GithubProvider, SourceControl};
pub use http::UpstreamHttp;
pub use lanyard::{LanyardProvider, Presence};
pub use sanity::{ContentCollection, ContentDocument, SanityProvider};
pub use spotify::{NowPlaying, SpotifyProvider};
pub use stripe::{CheckoutClient, CheckoutRequest, CheckoutSession};
pub use umami::{Analytics, UmamiProvider};
