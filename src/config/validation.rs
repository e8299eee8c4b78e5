//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (TTLs and timeouts > 0, attempts within bounds)
//! - Check addresses and upstream URLs parse
//! - Check enabled providers carry the ids they need
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FeedsConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{FeedSettings, FeedsConfig};
use crate::resilience::MAX_UPSTREAM_ATTEMPTS;

/// One semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &FeedsConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::new("timeouts.upstream_secs", "must be greater than 0"));
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 || retries.max_attempts > MAX_UPSTREAM_ATTEMPTS {
        errors.push(ValidationError::new(
            "retries.max_attempts",
            format!("must be between 1 and {MAX_UPSTREAM_ATTEMPTS}"),
        ));
    }
    if retries.max_delay_ms < retries.base_delay_ms {
        errors.push(ValidationError::new(
            "retries.max_delay_ms",
            "must not be smaller than base_delay_ms",
        ));
    }

    let providers = &config.providers;

    let spotify = &providers.now_playing;
    if check_feed(&mut errors, "providers.now_playing", &spotify.feed) {
        check_url(&mut errors, "providers.now_playing.token_url", &spotify.token_url);
        check_url(&mut errors, "providers.now_playing.api_url", &spotify.api_url);
    }

    let lanyard = &providers.presence;
    if check_feed(&mut errors, "providers.presence", &lanyard.feed) {
        check_url(&mut errors, "providers.presence.api_url", &lanyard.api_url);
        check_present(&mut errors, "providers.presence.user_id", &lanyard.user_id);
    }

    let umami = &providers.analytics;
    if check_feed(&mut errors, "providers.analytics", &umami.feed) {
        check_url(&mut errors, "providers.analytics.api_url", &umami.api_url);
        check_present(&mut errors, "providers.analytics.website_id", &umami.website_id);
    }

    let github = &providers.github;
    if check_feed(&mut errors, "providers.github", &github.feed) {
        check_url(&mut errors, "providers.github.api_url", &github.api_url);
        check_present(&mut errors, "providers.github.username", &github.username);
    }

    let sanity = &providers.content;
    if check_feed(&mut errors, "providers.content", &sanity.feed) {
        if sanity.api_url.is_none() {
            check_present(&mut errors, "providers.content.project_id", &sanity.project_id);
        }
        check_present(&mut errors, "providers.content.dataset", &sanity.dataset);
        check_url(&mut errors, "providers.content.api_url", &sanity.base_url());
    }

    let checkout = &config.checkout;
    if checkout.enabled {
        check_url(&mut errors, "checkout.api_url", &checkout.api_url);
        check_url(&mut errors, "checkout.success_url", &checkout.success_url);
        check_url(&mut errors, "checkout.cancel_url", &checkout.cancel_url);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Returns whether the provider is enabled, after checking its feed settings.
fn check_feed(errors: &mut Vec<ValidationError>, section: &str, feed: &FeedSettings) -> bool {
    if feed.enabled && feed.ttl_secs == 0 {
        errors.push(ValidationError::new(
            format!("{section}.feed.ttl_secs"),
            "must be greater than 0",
        ));
    }
    feed.enabled
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            field,
            format!("'{value}' is not a socket address"),
        ));
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if let Err(e) = url::Url::parse(value) {
        errors.push(ValidationError::new(field, format!("'{value}' is not a URL: {e}")));
    }
}

fn check_present(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::new(field, "is required when the feed is enabled"));
    }
}
