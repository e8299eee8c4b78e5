//! Payment checkout (Stripe Checkout Sessions). Never cached.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::CheckoutConfig;
use crate::error::{FeedError, TransportError};
use crate::providers::http::UpstreamHttp;
use crate::validate::{validate, Field, Schema};

const PROVIDER: &str = "checkout";

/// Inbound request body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub price_id: String,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// Opaque session handed back to the browser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: Option<String>,
}

static SESSION: Schema = Schema::Object(&[
    Field::required("id", Schema::String),
    Field::optional("url", Schema::Nullable(&Schema::String)),
]);

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

pub struct CheckoutClient {
    http: Arc<UpstreamHttp>,
    url: String,
    secret_key: String,
    success_url: String,
    cancel_url: String,
}

impl CheckoutClient {
    pub fn new(http: Arc<UpstreamHttp>, config: &CheckoutConfig, secret_key: String) -> Self {
        Self {
            http,
            url: format!("{}/v1/checkout/sessions", config.api_url.trim_end_matches('/')),
            secret_key,
            success_url: config.success_url.clone(),
            cancel_url: config.cancel_url.clone(),
        }
    }

    /// Create a one-off payment session for `request`.
    pub async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, FeedError> {
        let quantity = request.quantity.unwrap_or(1).max(1).to_string();
        let form = [
            ("mode", "payment"),
            ("line_items[0][price]", request.price_id.as_str()),
            ("line_items[0][quantity]", quantity.as_str()),
            ("success_url", self.success_url.as_str()),
            ("cancel_url", self.cancel_url.as_str()),
        ];
        // Same key on every attempt so a retried POST cannot create two sessions.
        let idempotency_key = uuid::Uuid::new_v4().to_string();

        let raw = self
            .http
            .send_json(PROVIDER, || {
                self.http
                    .client()
                    .post(&self.url)
                    .bearer_auth(&self.secret_key)
                    .header("Idempotency-Key", &idempotency_key)
                    .form(&form)
            })
            .await?
            .ok_or_else(|| TransportError::Decode("empty checkout response".to_string()))?;

        let session: SessionResponse = validate(raw, &SESSION).into_result()?;
        tracing::info!(session_id = %session.id, "Checkout session created");
        Ok(CheckoutSession {
            session_id: session.id,
            url: session.url,
        })
    }
}
