//! `Feed<P>`: cache lookup, upstream refresh and degradation for one provider.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::{CacheEntry, TtlCache};
use crate::error::{FeedError, FeedResult, TransportError};
use crate::feed::policy::{degrade, FeedPolicy, FetchOutcome};
use crate::feed::provider::{CacheKey, Provider, ProviderId};
use crate::observability::metrics;
use crate::resilience::with_deadline;

/// A provider together with its cache and policy.
pub struct Feed<P: Provider> {
    provider: Arc<P>,
    cache: Arc<TtlCache<P::Key, P::Output>>,
    policy: FeedPolicy<P::Output>,
    fetch_timeout: Duration,
}

impl<P: Provider> Feed<P> {
    /// `cache` must have been built with `policy.ttl`.
    pub fn new(
        provider: P,
        cache: Arc<TtlCache<P::Key, P::Output>>,
        policy: FeedPolicy<P::Output>,
        fetch_timeout: Duration,
    ) -> Self {
        debug_assert_eq!(cache.ttl(), policy.ttl);
        Self {
            provider: Arc::new(provider),
            cache,
            policy,
            fetch_timeout,
        }
    }

    pub fn id(&self) -> ProviderId {
        self.provider.id()
    }

    pub fn policy(&self) -> &FeedPolicy<P::Output> {
        &self.policy
    }

    /// Serve `key` from cache, upstream, stale cache or fallback, in that order.
    pub async fn resolve(&self, key: &P::Key) -> FetchOutcome<Arc<P::Output>> {
        let outcome = self.resolve_inner(key).await;
        metrics::record_request(self.id().as_str(), outcome.label());
        outcome
    }

    async fn resolve_inner(&self, key: &P::Key) -> FetchOutcome<Arc<P::Output>> {
        let provider = self.id();

        if let Some(entry) = self.cache.get_fresh(key) {
            tracing::debug!(provider = %provider, key = %key.label(), "Cache hit");
            return FetchOutcome::Cached(entry.value.clone());
        }

        let started = Instant::now();
        match self.refresh(key).await {
            Ok(entry) => {
                tracing::info!(
                    provider = %provider,
                    key = %key.label(),
                    elapsed = ?started.elapsed(),
                    "Feed refreshed"
                );
                FetchOutcome::Fresh(entry.value.clone())
            }
            Err(error) => {
                let stale = self.cache.get(key).map(|entry| entry.value.clone());
                tracing::warn!(
                    provider = %provider,
                    key = %key.label(),
                    kind = error.kind(),
                    error = %error,
                    serving_stale = stale.is_some(),
                    has_fallback = self.policy.fallback.is_some(),
                    "Upstream fetch failed"
                );
                degrade(stale, self.policy.fallback.as_ref(), error)
            }
        }
    }

    /// Fetch, validate and store in a task of its own, so dropping the
    /// calling request does not abandon a write the next caller can use.
    async fn refresh(&self, key: &P::Key) -> FeedResult<Arc<CacheEntry<P::Output>>> {
        let task = tokio::spawn(fetch_and_store(
            self.provider.clone(),
            self.cache.clone(),
            key.clone(),
            self.fetch_timeout,
        ));

        match task.await {
            Ok(result) => result,
            Err(e) => Err(FeedError::Transport(TransportError::Network(format!(
                "fetch task failed: {e}"
            )))),
        }
    }
}

async fn fetch_and_store<P: Provider>(
    provider: Arc<P>,
    cache: Arc<TtlCache<P::Key, P::Output>>,
    key: P::Key,
    deadline: Duration,
) -> FeedResult<Arc<CacheEntry<P::Output>>> {
    let raw = with_deadline(deadline, provider.fetch(&key)).await?;
    let value = provider.decode(&key, raw).into_result()?;
    let entry = cache.put(key, Arc::new(value));
    metrics::record_cache_write(provider.id().as_str());
    Ok(entry)
}

/// Cache state of one key, as shown by the admin API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    pub key: String,
    pub fetched_at_ms: u64,
    pub age_ms: u64,
    pub fresh: bool,
}

/// Cache state of one feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedInspect {
    pub provider: ProviderId,
    pub ttl_secs: u64,
    pub entries: Vec<CacheSnapshot>,
}

/// Type-erased view of a feed for status reporting.
pub trait FeedStatus: Send + Sync {
    fn id(&self) -> ProviderId;
    fn inspect(&self) -> FeedInspect;
}

impl<P: Provider> FeedStatus for Feed<P> {
    fn id(&self) -> ProviderId {
        Feed::id(self)
    }

    fn inspect(&self) -> FeedInspect {
        let now = self.cache.now_ms();
        let mut entries: Vec<CacheSnapshot> = self
            .cache
            .snapshot()
            .into_iter()
            .map(|(key, entry)| CacheSnapshot {
                key: key.label(),
                fetched_at_ms: entry.fetched_at_ms,
                age_ms: entry.age(now).as_millis() as u64,
                fresh: entry.is_fresh(now, self.policy.ttl),
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        FeedInspect {
            provider: Feed::id(self),
            ttl_secs: self.policy.ttl.as_secs(),
            entries,
        }
    }
}
