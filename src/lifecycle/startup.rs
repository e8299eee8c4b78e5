//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the shared upstream HTTP client
//! - Build one cache, one provider and one feed per enabled integration
//! - Attach each provider's fallback according to its settings
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Disabled providers are simply absent; their endpoints answer 500

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Clock, TtlCache};
use crate::config::{ConfigError, FeedSettings, FeedsConfig, Secrets};
use crate::feed::{Feed, FeedPolicy, FeedStatus, Provider, ProviderId};
use crate::providers::{
    Analytics, CheckoutClient, GithubProvider, LanyardProvider, NowPlaying, SanityProvider,
    SpotifyProvider, UmamiProvider, UpstreamHttp,
};
use crate::resilience::RetryPolicy;

/// Everything the HTTP layer serves from, built once.
pub struct Feeds {
    pub now_playing: Option<Feed<SpotifyProvider>>,
    pub presence: Option<Feed<LanyardProvider>>,
    pub analytics: Option<Feed<UmamiProvider>>,
    pub github: Option<Feed<GithubProvider>>,
    pub content: Option<Feed<SanityProvider>>,
    pub checkout: Option<CheckoutClient>,
    /// Deadline for calls made outside a feed (checkout).
    pub upstream_timeout: Duration,
}

impl Feeds {
    /// Enabled feeds, in `ProviderId::ALL` order.
    pub fn statuses(&self) -> Vec<&dyn FeedStatus> {
        let mut statuses: Vec<&dyn FeedStatus> = Vec::new();
        if let Some(feed) = &self.now_playing {
            statuses.push(feed);
        }
        if let Some(feed) = &self.presence {
            statuses.push(feed);
        }
        if let Some(feed) = &self.analytics {
            statuses.push(feed);
        }
        if let Some(feed) = &self.github {
            statuses.push(feed);
        }
        if let Some(feed) = &self.content {
            statuses.push(feed);
        }
        statuses
    }

    pub fn is_enabled(&self, provider: ProviderId) -> bool {
        self.statuses().iter().any(|status| status.id() == provider)
    }
}

/// Build every enabled feed from validated configuration and resolved secrets.
pub fn bootstrap(
    config: &FeedsConfig,
    secrets: &Secrets,
    clock: Arc<dyn Clock>,
) -> Result<Feeds, ConfigError> {
    let http = Arc::new(UpstreamHttp::new(
        &config.timeouts,
        RetryPolicy::from_config(&config.retries),
    )?);
    let timeout = config.timeouts.upstream();
    let providers = &config.providers;

    let now_playing = match &providers.now_playing {
        spotify if spotify.feed.enabled => {
            let credentials = secrets.spotify.clone().ok_or_else(|| ConfigError::MissingSecret {
                provider: "now_playing",
                var: spotify.refresh_token_env.clone(),
            })?;
            let provider = SpotifyProvider::new(http.clone(), spotify, credentials);
            Some(build_feed(provider, &spotify.feed, Some(NowPlaying::idle()), &clock, timeout))
        }
        _ => None,
    };

    let presence = match &providers.presence {
        lanyard if lanyard.feed.enabled => {
            let provider = LanyardProvider::new(http.clone(), lanyard);
            Some(build_feed(provider, &lanyard.feed, None, &clock, timeout))
        }
        _ => None,
    };

    let analytics = match &providers.analytics {
        umami if umami.feed.enabled => {
            let token = secrets.umami_token.clone().ok_or_else(|| ConfigError::MissingSecret {
                provider: "analytics",
                var: umami.token_env.clone(),
            })?;
            let provider = UmamiProvider::new(http.clone(), umami, token);
            Some(build_feed(provider, &umami.feed, Some(Analytics::empty()), &clock, timeout))
        }
        _ => None,
    };

    let github = match &providers.github {
        github if github.feed.enabled => {
            let provider = GithubProvider::new(http.clone(), github, secrets.github_token.clone());
            Some(build_feed(provider, &github.feed, None, &clock, timeout))
        }
        _ => None,
    };

    let content = match &providers.content {
        sanity if sanity.feed.enabled => {
            let provider = SanityProvider::new(http.clone(), sanity, secrets.sanity_token.clone());
            Some(build_feed(provider, &sanity.feed, Some(Vec::new()), &clock, timeout))
        }
        _ => None,
    };

    let checkout = if config.checkout.enabled {
        let secret_key = secrets.stripe_secret_key.clone().ok_or_else(|| ConfigError::MissingSecret {
            provider: "checkout",
            var: config.checkout.secret_key_env.clone(),
        })?;
        tracing::info!("Checkout enabled");
        Some(CheckoutClient::new(http.clone(), &config.checkout, secret_key))
    } else {
        None
    };

    Ok(Feeds {
        now_playing,
        presence,
        analytics,
        github,
        content,
        checkout,
        upstream_timeout: timeout,
    })
}

fn build_feed<P: Provider>(
    provider: P,
    settings: &FeedSettings,
    fallback: Option<P::Output>,
    clock: &Arc<dyn Clock>,
    timeout: Duration,
) -> Feed<P> {
    let policy = FeedPolicy::from_settings(settings, fallback);
    let cache = Arc::new(TtlCache::new(policy.ttl, clock.clone()));
    tracing::info!(
        provider = %provider.id(),
        ttl_secs = settings.ttl_secs,
        fallback = policy.fallback.is_some(),
        mask_failure_as_success = policy.mask_failure_as_success,
        "Feed enabled"
    );
    Feed::new(provider, cache, policy, timeout)
}
