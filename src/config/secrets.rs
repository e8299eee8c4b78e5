//! Credential resolution.
//!
//! The configuration file only names environment variables; this module reads
//! them once at boot. A secret that an enabled provider cannot work without is
//! a fatal [`ConfigError::MissingSecret`]. Optional tokens (GitHub, Sanity)
//! simply stay unset.

use std::collections::HashMap;
use std::fmt;

use crate::config::loader::ConfigError;
use crate::config::schema::FeedsConfig;

/// Where secret values come from.
pub trait SecretSource {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads process environment variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSource;

impl SecretSource for EnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl SecretSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// Refresh-token grant inputs for the music provider.
#[derive(Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Every credential the service may need, resolved once.
#[derive(Clone, Default)]
pub struct Secrets {
    pub spotify: Option<SpotifyCredentials>,
    pub umami_token: Option<String>,
    pub github_token: Option<String>,
    pub sanity_token: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub admin_api_key: Option<String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = |value: &Option<String>| if value.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("spotify", &self.spotify)
            .field("umami_token", &set(&self.umami_token))
            .field("github_token", &set(&self.github_token))
            .field("sanity_token", &set(&self.sanity_token))
            .field("stripe_secret_key", &set(&self.stripe_secret_key))
            .field("admin_api_key", &set(&self.admin_api_key))
            .finish()
    }
}

impl Secrets {
    /// Resolve the secrets needed by the enabled parts of `config`.
    pub fn resolve(config: &FeedsConfig, source: &impl SecretSource) -> Result<Self, ConfigError> {
        let providers = &config.providers;
        let mut secrets = Secrets::default();

        if providers.now_playing.feed.enabled {
            let spotify = &providers.now_playing;
            secrets.spotify = Some(SpotifyCredentials {
                client_id: require(source, "now_playing", &spotify.client_id_env)?,
                client_secret: require(source, "now_playing", &spotify.client_secret_env)?,
                refresh_token: require(source, "now_playing", &spotify.refresh_token_env)?,
            });
        }

        if providers.analytics.feed.enabled {
            secrets.umami_token = Some(require(source, "analytics", &providers.analytics.token_env)?);
        }

        if providers.github.feed.enabled {
            secrets.github_token = optional(source, providers.github.token_env.as_deref());
        }

        if providers.content.feed.enabled {
            secrets.sanity_token = optional(source, providers.content.token_env.as_deref());
        }

        if config.checkout.enabled {
            secrets.stripe_secret_key = Some(require(source, "checkout", &config.checkout.secret_key_env)?);
        }

        if config.admin.enabled {
            secrets.admin_api_key = Some(require(source, "admin", &config.admin.api_key_env)?);
        }

        Ok(secrets)
    }
}

fn require(
    source: &impl SecretSource,
    provider: &'static str,
    var: &str,
) -> Result<String, ConfigError> {
    source
        .get(var)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::MissingSecret {
            provider,
            var: var.to_string(),
        })
}

fn optional(source: &impl SecretSource, var: Option<&str>) -> Option<String> {
    var.and_then(|var| source.get(var)).filter(|value| !value.is_empty())
}
