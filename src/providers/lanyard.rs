//! Presence/status feed (Lanyard). No credentials.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::config::LanyardConfig;
use crate::error::TransportError;
use crate::feed::{Provider, ProviderId};
use crate::providers::http::UpstreamHttp;
use crate::validate::{validate, Field, Schema, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Idle,
    Dnd,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    pub user_id: String,
    pub display_name: String,
    /// Avatar hash; `null` when the user has the default avatar.
    pub avatar_ref: Option<String>,
    pub status: PresenceStatus,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub name: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

const ACTIVITY: Schema = Schema::Object(&[
    Field::required("name", Schema::String),
    Field::required("type", Schema::Integer),
    Field::optional("state", Schema::Nullable(&Schema::String)),
    Field::optional("details", Schema::Nullable(&Schema::String)),
]);

static PRESENCE: Schema = Schema::Object(&[
    Field::required("success", Schema::Boolean),
    Field::required(
        "data",
        Schema::Object(&[
            Field::required(
                "discord_user",
                Schema::Object(&[
                    Field::required("id", Schema::String),
                    Field::required("username", Schema::String),
                    Field::optional("global_name", Schema::Nullable(&Schema::String)),
                    Field::optional("avatar", Schema::Nullable(&Schema::String)),
                ]),
            ),
            Field::required(
                "discord_status",
                Schema::OneOf(&["online", "idle", "dnd", "offline"]),
            ),
            Field::required("activities", Schema::Array(&ACTIVITY)),
        ]),
    ),
]);

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Data,
}

#[derive(Debug, Deserialize)]
struct Data {
    discord_user: DiscordUser,
    discord_status: PresenceStatus,
    activities: Vec<RawActivity>,
}

#[derive(Debug, Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    #[serde(default)]
    global_name: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawActivity {
    name: String,
    #[serde(rename = "type")]
    kind: i64,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

fn activity_kind(code: i64) -> &'static str {
    match code {
        0 => "playing",
        1 => "streaming",
        2 => "listening",
        3 => "watching",
        4 => "custom",
        5 => "competing",
        _ => "unknown",
    }
}

pub struct LanyardProvider {
    http: Arc<UpstreamHttp>,
    url: String,
}

impl LanyardProvider {
    pub fn new(http: Arc<UpstreamHttp>, config: &LanyardConfig) -> Self {
        let url = format!(
            "{}/v1/users/{}",
            config.api_url.trim_end_matches('/'),
            config.user_id
        );
        Self { http, url }
    }
}

impl Provider for LanyardProvider {
    type Key = ();
    type Output = Presence;

    fn id(&self) -> ProviderId {
        ProviderId::Presence
    }

    async fn fetch(&self, _key: &()) -> Result<Value, TransportError> {
        self.http
            .send_json(ProviderId::Presence.as_str(), || self.http.client().get(&self.url))
            .await?
            .ok_or_else(|| TransportError::Decode("empty presence response".to_string()))
    }

    fn decode(&self, _key: &(), raw: Value) -> ValidationResult<Presence> {
        decode_presence(raw)
    }
}

fn decode_presence(raw: Value) -> ValidationResult<Presence> {
    validate::<Envelope>(raw, &PRESENCE).map(|Envelope { data }| {
        let user = data.discord_user;
        Presence {
            display_name: user.global_name.unwrap_or(user.username),
            user_id: user.id,
            avatar_ref: user.avatar,
            status: data.discord_status,
            activities: data
                .activities
                .into_iter()
                .map(|activity| Activity {
                    name: activity.name,
                    kind: activity_kind(activity.kind),
                    state: activity.state,
                    details: activity.details,
                })
                .collect(),
        }
    })
}
