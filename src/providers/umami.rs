//! Web analytics (Umami website stats).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::UmamiConfig;
use crate::error::TransportError;
use crate::feed::{Provider, ProviderId};
use crate::providers::http::UpstreamHttp;
use crate::validate::{validate, Field, Schema, ValidationResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_pageviews: u64,
}

impl Analytics {
    pub fn empty() -> Self {
        Self { total_pageviews: 0 }
    }
}

static STATS: Schema = Schema::Object(&[Field::required(
    "pageviews",
    Schema::Object(&[Field::required("value", Schema::Unsigned)]),
)]);

#[derive(Debug, Deserialize)]
struct Stats {
    pageviews: Metric,
}

#[derive(Debug, Deserialize)]
struct Metric {
    value: u64,
}

pub struct UmamiProvider {
    http: Arc<UpstreamHttp>,
    url: String,
    token: String,
}

impl UmamiProvider {
    pub fn new(http: Arc<UpstreamHttp>, config: &UmamiConfig, token: String) -> Self {
        let url = format!(
            "{}/api/websites/{}/stats",
            config.api_url.trim_end_matches('/'),
            config.website_id
        );
        Self { http, url, token }
    }
}

impl Provider for UmamiProvider {
    type Key = ();
    type Output = Analytics;

    fn id(&self) -> ProviderId {
        ProviderId::Analytics
    }

    async fn fetch(&self, _key: &()) -> Result<Value, TransportError> {
        // All-time totals: from the epoch up to now.
        let end_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
            .to_string();
        let query = [("startAt", "0"), ("endAt", end_at.as_str())];

        self.http
            .send_json(ProviderId::Analytics.as_str(), || {
                self.http
                    .client()
                    .get(&self.url)
                    .query(&query)
                    .bearer_auth(&self.token)
            })
            .await?
            .ok_or_else(|| TransportError::Decode("empty stats response".to_string()))
    }

    fn decode(&self, _key: &(), raw: Value) -> ValidationResult<Analytics> {
        validate::<Stats>(raw, &STATS).map(|stats| Analytics {
            total_pageviews: stats.pageviews.value,
        })
    }
}
