//! Error taxonomy for the feed layer.
//!
//! # Design Decisions
//! - Transport and validation failures are recoverable; they stop at the
//!   degradation boundary in `feed` and never reach a caller as-is
//! - Configuration failures are fatal at boot (see `config::ConfigError`)
//! - Messages shown to end users are generic; full detail goes to the log

use std::time::Duration;
use thiserror::Error;

use crate::validate::FieldError;

/// Failure to obtain a raw payload from an upstream provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, DNS or body read failure.
    #[error("upstream request failed: {0}")]
    Network(String),

    /// Upstream answered with a non-2xx status.
    #[error("upstream returned status {status}: {cause}")]
    Status { status: u16, cause: String },

    /// Upstream answered 2xx with a body that is not JSON.
    #[error("upstream body is not valid JSON: {0}")]
    Decode(String),

    /// The fetch did not finish within the configured deadline.
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    /// Short-lived credential could not be obtained.
    #[error("credential exchange failed: {cause}")]
    Credentials { status: Option<u16>, cause: String },
}

impl TransportError {
    /// HTTP status reported by the upstream, when there was one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Credentials { status, .. } => *status,
            TransportError::Network(_) | TransportError::Decode(_) | TransportError::Timeout(_) => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => TransportError::Status {
                status: status.as_u16(),
                cause: err.to_string(),
            },
            None => TransportError::Network(err.to_string()),
        }
    }
}

/// Any failure a feed can end up reporting.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeedError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("upstream payload failed validation: {}", describe(.0))]
    Validation(Vec<FieldError>),

    #[error("feed not configured: {0}")]
    Configuration(String),
}

impl FeedError {
    /// Message safe to hand to an end user.
    pub fn public_message(&self) -> &'static str {
        match self {
            FeedError::Transport(_) => "upstream service unavailable",
            FeedError::Validation(_) => "upstream service returned an unexpected response",
            FeedError::Configuration(_) => "feed is not configured",
        }
    }

    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::Transport(_) => "transport",
            FeedError::Validation(_) => "validation",
            FeedError::Configuration(_) => "configuration",
        }
    }
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
