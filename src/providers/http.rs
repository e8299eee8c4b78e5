//! Shared outbound HTTP client for all providers.
//!
//! # Responsibilities
//! - Own the pooled `reqwest::Client` (connect timeout, user agent)
//! - Run the bounded retry loop with jittered backoff
//! - Map responses to JSON or `TransportError`
//! - Record per-attempt metrics
//!
//! The overall deadline is not enforced here: `Feed` wraps the whole fetch,
//! retries and token exchange included, in one timeout.

use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::config::TimeoutConfig;
use crate::error::TransportError;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;

/// Longest upstream error body kept in a `TransportError`.
const MAX_ERROR_BODY: usize = 256;

pub struct UpstreamHttp {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl UpstreamHttp {
    pub fn new(timeouts: &TimeoutConfig, retry: RetryPolicy) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .user_agent(concat!("portfolio-feeds/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, retry })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send the request produced by `build`, retrying when the policy allows.
    ///
    /// `build` is called once per attempt. A 204 yields `Ok(None)`.
    /// `provider` labels logs and metrics.
    pub async fn send_json<F>(
        &self,
        provider: &'static str,
        build: F,
    ) -> Result<Option<Value>, TransportError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send_once(provider, build()).await {
                Err(err) if self.retry.should_retry(attempt, &err) => {
                    let delay = self.retry.delay(attempt);
                    tracing::info!(
                        provider,
                        attempt,
                        delay = ?delay,
                        error = %err,
                        "Retrying upstream request"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    async fn send_once(
        &self,
        provider: &'static str,
        request: RequestBuilder,
    ) -> Result<Option<Value>, TransportError> {
        let started = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_upstream(provider, "error".to_string(), started.elapsed());
                return Err(TransportError::from(e));
            }
        };

        let status = response.status();
        metrics::record_upstream(provider, status.as_u16().to_string(), started.elapsed());
        tracing::debug!(provider, status = status.as_u16(), "Upstream responded");

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                cause: truncate(&body),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

fn truncate(body: &str) -> String {
    let body = body.trim();
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
