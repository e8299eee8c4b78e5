//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the feeds
//! service. All types derive Serde traits for deserialization from TOML.
//! Secrets never live here: providers name the environment variables that
//! hold them (`*_env` fields) and `config::secrets` resolves those.

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Root configuration for the feeds service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FeedsConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Inbound and upstream timeouts.
    pub timeouts: TimeoutConfig,

    /// Upstream retry configuration.
    pub retries: RetryConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,

    /// One section per upstream provider.
    pub providers: ProvidersConfig,

    pub checkout: CheckoutConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for handling one inbound request, in seconds.
    pub request_secs: u64,

    /// Deadline for one upstream fetch (token exchange and retries included).
    pub upstream_secs: u64,

    /// Connection establishment timeout for upstream calls, in seconds.
    pub connect_secs: u64,
}

impl TimeoutConfig {
    pub fn upstream(&self) -> Duration {
        Duration::from_secs(self.upstream_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 10,
            connect_secs: 5,
        }
    }
}

/// Retry configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per upstream request, 1 or 2.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay_ms: 100,
            max_delay_ms: 1000,
        }
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Full,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin endpoints (cache inspection, status).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    pub enabled: bool,

    /// Environment variable holding the bearer API key.
    pub api_key_env: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key_env: "FEEDS_ADMIN_API_KEY".to_string(),
        }
    }
}

/// Caching and degradation settings shared by every feed.
///
/// A `feed` table may set any subset of these keys; the rest come from the
/// owning provider's defaults, not from a global default.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FeedSettings {
    pub enabled: bool,

    /// How long a fetched value is served without contacting the upstream.
    pub ttl_secs: u64,

    /// Answer failures with HTTP 200 and an `error` field instead of 500.
    pub mask_failure_as_success: bool,

    /// Serve the provider's built-in fallback when nothing is cached.
    pub use_fallback: bool,
}

impl FeedSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    const fn defaults(ttl_secs: u64, mask_failure_as_success: bool, use_fallback: bool) -> Self {
        Self {
            enabled: false,
            ttl_secs,
            mask_failure_as_success,
            use_fallback,
        }
    }
}

/// Keys present in one `feed` table.
#[derive(Debug, Default, Deserialize)]
struct FeedOverrides {
    enabled: Option<bool>,
    ttl_secs: Option<u64>,
    mask_failure_as_success: Option<bool>,
    use_fallback: Option<bool>,
}

impl FeedOverrides {
    fn over(self, defaults: FeedSettings) -> FeedSettings {
        FeedSettings {
            enabled: self.enabled.unwrap_or(defaults.enabled),
            ttl_secs: self.ttl_secs.unwrap_or(defaults.ttl_secs),
            mask_failure_as_success: self
                .mask_failure_as_success
                .unwrap_or(defaults.mask_failure_as_success),
            use_fallback: self.use_fallback.unwrap_or(defaults.use_fallback),
        }
    }
}

fn now_playing_feed<'de, D: Deserializer<'de>>(d: D) -> Result<FeedSettings, D::Error> {
    FeedOverrides::deserialize(d).map(|o| o.over(SpotifyConfig::FEED))
}

fn presence_feed<'de, D: Deserializer<'de>>(d: D) -> Result<FeedSettings, D::Error> {
    FeedOverrides::deserialize(d).map(|o| o.over(LanyardConfig::FEED))
}

fn analytics_feed<'de, D: Deserializer<'de>>(d: D) -> Result<FeedSettings, D::Error> {
    FeedOverrides::deserialize(d).map(|o| o.over(UmamiConfig::FEED))
}

fn github_feed<'de, D: Deserializer<'de>>(d: D) -> Result<FeedSettings, D::Error> {
    FeedOverrides::deserialize(d).map(|o| o.over(GithubConfig::FEED))
}

fn content_feed<'de, D: Deserializer<'de>>(d: D) -> Result<FeedSettings, D::Error> {
    FeedOverrides::deserialize(d).map(|o| o.over(SanityConfig::FEED))
}

/// All provider sections.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub now_playing: SpotifyConfig,
    pub presence: LanyardConfig,
    pub analytics: UmamiConfig,
    pub github: GithubConfig,
    pub content: SanityConfig,
}

/// Music-listening status (Spotify).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpotifyConfig {
    #[serde(deserialize_with = "now_playing_feed")]
    pub feed: FeedSettings,
    pub token_url: String,
    pub api_url: String,
    pub client_id_env: String,
    pub client_secret_env: String,
    pub refresh_token_env: String,
}

impl SpotifyConfig {
    const FEED: FeedSettings = FeedSettings::defaults(30, true, true);
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            feed: Self::FEED,
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            api_url: "https://api.spotify.com/v1".to_string(),
            client_id_env: "SPOTIFY_CLIENT_ID".to_string(),
            client_secret_env: "SPOTIFY_CLIENT_SECRET".to_string(),
            refresh_token_env: "SPOTIFY_REFRESH_TOKEN".to_string(),
        }
    }
}

/// Presence/status feed (Lanyard). No credentials.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LanyardConfig {
    #[serde(deserialize_with = "presence_feed")]
    pub feed: FeedSettings,
    pub api_url: String,
    /// Discord user id to report on.
    pub user_id: String,
}

impl LanyardConfig {
    const FEED: FeedSettings = FeedSettings::defaults(15, false, false);
}

impl Default for LanyardConfig {
    fn default() -> Self {
        Self {
            feed: Self::FEED,
            api_url: "https://api.lanyard.rest".to_string(),
            user_id: String::new(),
        }
    }
}

/// Web analytics (Umami).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UmamiConfig {
    #[serde(deserialize_with = "analytics_feed")]
    pub feed: FeedSettings,
    pub api_url: String,
    pub website_id: String,
    pub token_env: String,
}

impl UmamiConfig {
    const FEED: FeedSettings = FeedSettings::defaults(3600, true, true);
}

impl Default for UmamiConfig {
    fn default() -> Self {
        Self {
            feed: Self::FEED,
            api_url: "https://api.umami.is".to_string(),
            website_id: String::new(),
            token_env: "UMAMI_API_TOKEN".to_string(),
        }
    }
}

/// Source-control statistics (GitHub).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GithubConfig {
    #[serde(deserialize_with = "github_feed")]
    pub feed: FeedSettings,
    pub api_url: String,
    pub username: String,
    /// Optional token; unauthenticated calls work with a lower rate limit.
    pub token_env: Option<String>,
}

impl GithubConfig {
    const FEED: FeedSettings = FeedSettings::defaults(3600, false, false);
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            feed: Self::FEED,
            api_url: "https://api.github.com".to_string(),
            username: String::new(),
            token_env: Some("GITHUB_TOKEN".to_string()),
        }
    }
}

/// Content records (Sanity).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SanityConfig {
    #[serde(deserialize_with = "content_feed")]
    pub feed: FeedSettings,
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    /// Overrides `https://<project_id>.api.sanity.io`.
    pub api_url: Option<String>,
    /// Optional token for private datasets.
    pub token_env: Option<String>,
}

impl SanityConfig {
    const FEED: FeedSettings = FeedSettings::defaults(300, true, true);

    pub fn base_url(&self) -> String {
        match &self.api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.api.sanity.io", self.project_id),
        }
    }
}

impl Default for SanityConfig {
    fn default() -> Self {
        Self {
            feed: Self::FEED,
            project_id: String::new(),
            dataset: "production".to_string(),
            api_version: "2023-05-03".to_string(),
            api_url: None,
            token_env: None,
        }
    }
}

/// Payment checkout (Stripe). Not cached.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckoutConfig {
    pub enabled: bool,
    pub api_url: String,
    pub secret_key_env: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.stripe.com".to_string(),
            secret_key_env: "STRIPE_SECRET_KEY".to_string(),
            success_url: "http://localhost:3000/checkout/success".to_string(),
            cancel_url: "http://localhost:3000/checkout/cancel".to_string(),
        }
    }
}
