//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, limits)
//!     → handlers.rs (pick feed and cache key)
//!     → Feed::resolve
//!     → response.rs (status, Cache-Control, X-Feed-Outcome)
//!     → Send to client
//! ```

pub mod handlers;
pub mod response;
pub mod server;

pub use response::{cache_control, outcome_response, X_FEED_OUTCOME};
pub use server::{AppState, HttpServer};
