//! Response transport: turns a `FetchOutcome` into an HTTP response.
//!
//! # Responsibilities
//! - Map outcomes to status codes (success, masked failure, failure)
//! - Derive `Cache-Control` from the provider TTL
//! - Tag every feed response with `X-Feed-Outcome` for diagnostics
//!
//! # Design Decisions
//! - Failure bodies carry a generic message; details stay in the log
//! - Masked failures are `no-store` so a CDN never pins an error body
//! - Hard failures carry no `Cache-Control` at all

use axum::{
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderMap, HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::error::FeedError;
use crate::feed::{FeedPolicy, FetchOutcome, ProviderId};

pub const X_FEED_OUTCOME: &str = "x-feed-outcome";

/// Shared-cache directive for a successful response.
pub fn cache_control(ttl: Duration) -> String {
    let ttl_ms = ttl.as_millis();
    format!(
        "public, s-maxage={}, stale-while-revalidate={}",
        ttl_ms / 1000,
        ttl_ms / 2000
    )
}

/// Build the response for one resolved feed request.
pub fn outcome_response<T: Serialize>(
    provider: ProviderId,
    outcome: FetchOutcome<Arc<T>>,
    policy: &FeedPolicy<T>,
) -> Response {
    let label = outcome.label();
    match outcome {
        FetchOutcome::Fresh(value) | FetchOutcome::Cached(value) | FetchOutcome::Degraded(value) => {
            match serde_json::to_vec(value.as_ref()) {
                Ok(body) => json_response(StatusCode::OK, label, Some(cache_control(policy.ttl)), body),
                Err(e) => {
                    tracing::error!(provider = %provider, error = %e, "Failed to serialize feed value");
                    json_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "failed",
                        None,
                        error_body("internal error"),
                    )
                }
            }
        }
        FetchOutcome::Failed(error) => failure_response(provider, &error, policy.mask_failure_as_success),
    }
}

/// Response for a feed that is disabled in configuration.
pub fn not_configured(provider: ProviderId) -> Response {
    let error = FeedError::Configuration(format!("{provider} is disabled"));
    failure_response(provider, &error, false)
}

fn failure_response(provider: ProviderId, error: &FeedError, mask: bool) -> Response {
    tracing::debug!(provider = %provider, kind = error.kind(), masked = mask, "Serving failure");
    let body = error_body(error.public_message());
    if mask {
        json_response(StatusCode::OK, "failed", Some("no-store".to_string()), body)
    } else {
        json_response(StatusCode::INTERNAL_SERVER_ERROR, "failed", None, body)
    }
}

/// Plain JSON error for non-feed endpoints.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    (status, headers, error_body(message)).into_response()
}

fn error_body(message: &str) -> Vec<u8> {
    json!({ "error": message }).to_string().into_bytes()
}

fn json_response(
    status: StatusCode,
    outcome: &'static str,
    cache_control: Option<String>,
    body: Vec<u8>,
) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(HeaderName::from_static(X_FEED_OUTCOME), HeaderValue::from_static(outcome));
    if let Some(value) = cache_control.and_then(|value| HeaderValue::from_str(&value).ok()) {
        headers.insert(CACHE_CONTROL, value);
    }
    (status, headers, body).into_response()
}
