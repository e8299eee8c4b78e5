//! The seam between the generic feed machinery and one upstream integration.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::hash::Hash;

use crate::error::TransportError;
use crate::validate::ValidationResult;

/// Stable identifier of a provider, used in logs, metrics and headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    NowPlaying,
    Presence,
    Analytics,
    SourceControl,
    Content,
}

impl ProviderId {
    pub const ALL: [ProviderId; 5] = [
        ProviderId::NowPlaying,
        ProviderId::Presence,
        ProviderId::Analytics,
        ProviderId::SourceControl,
        ProviderId::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::NowPlaying => "now-playing",
            ProviderId::Presence => "presence",
            ProviderId::Analytics => "analytics",
            ProviderId::SourceControl => "source-control",
            ProviderId::Content => "content",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key selecting one cache slot within a provider.
pub trait CacheKey: Eq + Hash + Clone + Send + Sync + 'static {
    /// Label used in logs and the admin cache listing.
    fn label(&self) -> String;
}

/// Single-slot providers use the unit key.
impl CacheKey for () {
    fn label(&self) -> String {
        "default".to_string()
    }
}

/// One upstream integration: how to fetch a raw payload and how to turn it
/// into the typed value served to callers.
pub trait Provider: Send + Sync + 'static {
    type Key: CacheKey;
    type Output: Serialize + Send + Sync + 'static;

    fn id(&self) -> ProviderId;

    /// Obtain the raw upstream payload for `key`.
    fn fetch(&self, key: &Self::Key)
        -> impl Future<Output = Result<Value, TransportError>> + Send;

    /// Validate `raw` and shape it into the served value.
    fn decode(&self, key: &Self::Key, raw: Value) -> ValidationResult<Self::Output>;
}
