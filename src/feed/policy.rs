//! Per-provider policy and the outcome of one resolution.

use std::sync::Arc;
use std::time::Duration;

use crate::config::FeedSettings;
use crate::error::FeedError;

/// Immutable per-provider behavior, built once at startup.
#[derive(Debug)]
pub struct FeedPolicy<T> {
    pub ttl: Duration,
    /// Served when the upstream fails and nothing is cached.
    pub fallback: Option<Arc<T>>,
    /// Report failures as 200 with an error body instead of 500.
    pub mask_failure_as_success: bool,
}

impl<T> FeedPolicy<T> {
    /// Apply `settings` to a provider whose built-in fallback is `fallback`.
    pub fn from_settings(settings: &FeedSettings, fallback: Option<T>) -> Self {
        Self {
            ttl: settings.ttl(),
            fallback: fallback.filter(|_| settings.use_fallback).map(Arc::new),
            mask_failure_as_success: settings.mask_failure_as_success,
        }
    }
}

// Manual impl: `T` itself need not be `Clone`.
impl<T> Clone for FeedPolicy<T> {
    fn clone(&self) -> Self {
        Self {
            ttl: self.ttl,
            fallback: self.fallback.clone(),
            mask_failure_as_success: self.mask_failure_as_success,
        }
    }
}

/// Result of resolving one request. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// Fetched and validated during this request.
    Fresh(T),
    /// Served from cache, either within TTL or stale after an upstream failure.
    Cached(T),
    /// The provider's fallback.
    Degraded(T),
    Failed(FeedError),
}

impl<T> FetchOutcome<T> {
    pub fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Fresh(_) => "fresh",
            FetchOutcome::Cached(_) => "cached",
            FetchOutcome::Degraded(_) => "degraded",
            FetchOutcome::Failed(_) => "failed",
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            FetchOutcome::Fresh(value)
            | FetchOutcome::Cached(value)
            | FetchOutcome::Degraded(value) => Some(value),
            FetchOutcome::Failed(_) => None,
        }
    }
}

/// Decide what to serve after the upstream path failed.
///
/// Any cached value wins over the fallback, whatever its age.
pub fn degrade<T>(
    stale: Option<Arc<T>>,
    fallback: Option<&Arc<T>>,
    error: FeedError,
) -> FetchOutcome<Arc<T>> {
    match (stale, fallback) {
        (Some(value), _) => FetchOutcome::Cached(value),
        (None, Some(fallback)) => FetchOutcome::Degraded(fallback.clone()),
        (None, None) => FetchOutcome::Failed(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    fn error() -> FeedError {
        FeedError::Transport(TransportError::Status {
            status: 503,
            cause: "unavailable".into(),
        })
    }

    #[test]
    fn test_stale_wins_over_fallback() {
        let stale = Arc::new(7);
        let fallback = Arc::new(0);
        let outcome = degrade(Some(stale.clone()), Some(&fallback), error());
        match outcome {
            FetchOutcome::Cached(value) => assert!(Arc::ptr_eq(&value, &stale)),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_fallback_then_failure() {
        let fallback = Arc::new(0);
        assert_eq!(
            degrade(None, Some(&fallback), error()),
            FetchOutcome::Degraded(Arc::new(0))
        );
        assert_eq!(degrade::<i32>(None, None, error()), FetchOutcome::Failed(error()));
    }

    #[test]
    fn test_policy_from_settings() {
        let mut settings = FeedSettings {
            enabled: true,
            ttl_secs: 30,
            mask_failure_as_success: true,
            use_fallback: true,
        };
        let policy = FeedPolicy::from_settings(&settings, Some("idle"));
        assert_eq!(policy.ttl, Duration::from_secs(30));
        assert_eq!(policy.fallback.as_deref(), Some(&"idle"));
        assert!(policy.mask_failure_as_success);

        settings.use_fallback = false;
        let policy = FeedPolicy::from_settings(&settings, Some("idle"));
        assert!(policy.fallback.is_none());
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(FetchOutcome::Fresh(1).label(), "fresh");
        assert_eq!(FetchOutcome::<i32>::Failed(error()).label(), "failed");
        assert_eq!(FetchOutcome::Degraded(2).value(), Some(&2));
    }
}
