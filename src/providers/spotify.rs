//! Music-listening status (Spotify "currently playing").
//!
//! A fetch first needs a short-lived access token obtained by exchanging the
//! long-lived refresh token. The token is kept until shortly before it
//! expires, so most cache misses cost a single upstream call.

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{SpotifyConfig, SpotifyCredentials};
use crate::error::{FeedError, TransportError};
use crate::feed::{Provider, ProviderId};
use crate::providers::http::UpstreamHttp;
use crate::validate::{validate, Field, Schema, ValidationResult};

/// Tokens are dropped this long before the upstream says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Served body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    pub is_playing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_name: Option<String>,
    #[serde(rename = "songURL", skip_serializing_if = "Option::is_none")]
    pub song_url: Option<String>,
    #[serde(rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl NowPlaying {
    pub fn idle() -> Self {
        Self {
            is_playing: false,
            song_name: None,
            artist_name: None,
            song_url: None,
            image_url: None,
        }
    }
}

const NAMED: Schema = Schema::Object(&[Field::required("name", Schema::String)]);
const IMAGE: Schema = Schema::Object(&[Field::required("url", Schema::String)]);

static CURRENTLY_PLAYING: Schema = Schema::Object(&[
    Field::required("is_playing", Schema::Boolean),
    Field::optional(
        "item",
        Schema::Nullable(&Schema::Object(&[
            Field::required("name", Schema::String),
            Field::optional("artists", Schema::Array(&NAMED)),
            Field::optional(
                "external_urls",
                Schema::Object(&[Field::optional("spotify", Schema::String)]),
            ),
            Field::optional(
                "album",
                Schema::Object(&[Field::optional("images", Schema::Array(&IMAGE))]),
            ),
        ])),
    ),
]);

static TOKEN: Schema = Schema::Object(&[
    Field::required("access_token", Schema::String),
    Field::required("expires_in", Schema::Unsigned),
]);

#[derive(Debug, Deserialize)]
struct CurrentlyPlaying {
    is_playing: bool,
    #[serde(default)]
    item: Option<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    name: String,
    #[serde(default)]
    artists: Vec<Named>,
    #[serde(default)]
    external_urls: ExternalUrls,
    #[serde(default)]
    album: Album,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Album {
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

pub struct SpotifyProvider {
    http: Arc<UpstreamHttp>,
    token_url: String,
    api_url: String,
    credentials: SpotifyCredentials,
    token: ArcSwapOption<AccessToken>,
}

impl SpotifyProvider {
    pub fn new(http: Arc<UpstreamHttp>, config: &SpotifyConfig, credentials: SpotifyCredentials) -> Self {
        Self {
            http,
            token_url: config.token_url.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            credentials,
            token: ArcSwapOption::empty(),
        }
    }

    async fn access_token(&self) -> Result<Arc<AccessToken>, TransportError> {
        if let Some(token) = self.token.load_full() {
            if Instant::now() < token.expires_at {
                return Ok(token);
            }
        }

        let token = Arc::new(self.exchange_refresh_token().await?);
        self.token.store(Some(token.clone()));
        Ok(token)
    }

    async fn exchange_refresh_token(&self) -> Result<AccessToken, TransportError> {
        let credentials = &self.credentials;
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", credentials.refresh_token.as_str()),
        ];

        let raw = self
            .http
            .send_json(ProviderId::NowPlaying.as_str(), || {
                self.http
                    .client()
                    .post(&self.token_url)
                    .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
                    .form(&form)
            })
            .await
            .map_err(|e| TransportError::Credentials {
                status: e.status_code(),
                cause: e.to_string(),
            })?
            .ok_or_else(|| TransportError::Credentials {
                status: Some(204),
                cause: "token endpoint returned no body".to_string(),
            })?;

        let token: TokenResponse = match validate(raw, &TOKEN) {
            ValidationResult::Valid(token) => token,
            ValidationResult::Invalid(errors) => {
                return Err(TransportError::Credentials {
                    status: None,
                    cause: format!("malformed token response: {}", FeedError::Validation(errors)),
                })
            }
        };

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        tracing::debug!(provider = %ProviderId::NowPlaying, lifetime = ?lifetime, "Access token refreshed");
        Ok(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}

impl Provider for SpotifyProvider {
    type Key = ();
    type Output = NowPlaying;

    fn id(&self) -> ProviderId {
        ProviderId::NowPlaying
    }

    async fn fetch(&self, _key: &()) -> Result<Value, TransportError> {
        let token = self.access_token().await?;
        let url = format!("{}/me/player/currently-playing", self.api_url);

        let result = self
            .http
            .send_json(ProviderId::NowPlaying.as_str(), || {
                self.http.client().get(&url).bearer_auth(&token.value)
            })
            .await;

        match result {
            // Nothing playing.
            Ok(None) => Ok(json!({ "is_playing": false })),
            Ok(Some(raw)) => Ok(raw),
            Err(err) => {
                if err.status_code() == Some(401) {
                    self.token.store(None);
                }
                Err(err)
            }
        }
    }

    fn decode(&self, _key: &(), raw: Value) -> ValidationResult<NowPlaying> {
        decode_currently_playing(raw)
    }
}

fn decode_currently_playing(raw: Value) -> ValidationResult<NowPlaying> {
    validate::<CurrentlyPlaying>(raw, &CURRENTLY_PLAYING).map(|playing| match playing.item {
        Some(item) if playing.is_playing => {
            let artists: Vec<_> = item.artists.into_iter().map(|artist| artist.name).collect();
            NowPlaying {
                is_playing: true,
                song_name: Some(item.name),
                artist_name: (!artists.is_empty()).then(|| artists.join(", ")),
                song_url: item.external_urls.spotify,
                image_url: item.album.images.into_iter().next().map(|image| image.url),
            }
        }
        _ => NowPlaying::idle(),
    })
}
