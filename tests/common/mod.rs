//! Shared utilities for integration tests: a scriptable upstream and a
//! service instance wired against it.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use portfolio_feeds::cache::{Clock, SystemClock};
use portfolio_feeds::config::{FeedsConfig, Secrets, SpotifyCredentials};
use portfolio_feeds::lifecycle::{bootstrap, Shutdown};
use portfolio_feeds::{AppState, HttpServer};

pub const ADMIN_KEY: &str = "test-admin-key";

type Script = VecDeque<(u16, Option<Value>)>;

#[derive(Default)]
struct MockState {
    scripts: Mutex<HashMap<String, Script>>,
    hits: Mutex<HashMap<String, u32>>,
}

/// Programmable upstream. Each path replays its scripted responses in order;
/// the last one repeats. Unscripted paths answer 404.
pub struct MockUpstream {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(respond).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Append a JSON response for `path`.
    pub fn respond(&self, path: &str, status: u16, body: Value) -> &Self {
        self.push(path, status, Some(body))
    }

    /// Append a bodiless response for `path`.
    pub fn respond_empty(&self, path: &str, status: u16) -> &Self {
        self.push(path, status, None)
    }

    /// Drop everything scripted for `path` and answer with `body` from now on.
    pub fn replace(&self, path: &str, status: u16, body: Value) -> &Self {
        self.state.scripts.lock().unwrap().remove(path);
        self.push(path, status, Some(body))
    }

    pub fn hits(&self, path: &str) -> u32 {
        self.state.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    fn push(&self, path: &str, status: u16, body: Option<Value>) -> &Self {
        self.state
            .scripts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back((status, body));
        self
    }
}

async fn respond(State(state): State<Arc<MockState>>, method: Method, uri: Uri) -> Response {
    let path = uri.path().to_string();
    *state.hits.lock().unwrap().entry(path.clone()).or_default() += 1;

    let next = {
        let mut scripts = state.scripts.lock().unwrap();
        match scripts.get_mut(&path) {
            Some(script) if script.len() > 1 => script.pop_front(),
            Some(script) => script.front().cloned(),
            None => None,
        }
    };

    match next {
        Some((status, body)) => {
            let status = StatusCode::from_u16(status).unwrap();
            match body {
                Some(body) => {
                    (status, [(CONTENT_TYPE, "application/json")], body.to_string()).into_response()
                }
                None => status.into_response(),
            }
        }
        None => (StatusCode::NOT_FOUND, format!("no script for {method} {path}")).into_response(),
    }
}

/// Configuration with every feed disabled and upstream URLs pointed at `upstream`.
pub fn config_for(upstream: &MockUpstream) -> FeedsConfig {
    let base = upstream.url();
    let mut config = FeedsConfig::default();
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 20;
    config.timeouts.upstream_secs = 5;

    let providers = &mut config.providers;
    providers.now_playing.token_url = format!("{base}/api/token");
    providers.now_playing.api_url = format!("{base}/v1");
    providers.presence.api_url = base.clone();
    providers.presence.user_id = "42".to_string();
    providers.analytics.api_url = base.clone();
    providers.analytics.website_id = "site".to_string();
    providers.github.api_url = base.clone();
    providers.github.username = "octocat".to_string();
    providers.content.project_id = "proj".to_string();
    providers.content.api_url = Some(base.clone());
    config.checkout.api_url = base;
    config
}

/// Secrets for every provider that needs one.
pub fn secrets() -> Secrets {
    Secrets {
        spotify: Some(SpotifyCredentials {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
        }),
        umami_token: Some("umami".to_string()),
        github_token: None,
        sanity_token: None,
        stripe_secret_key: Some("sk_test".to_string()),
        admin_api_key: Some(ADMIN_KEY.to_string()),
    }
}

/// A running service instance. Shuts down when dropped.
pub struct TestService {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestService {
    pub async fn start(config: FeedsConfig) -> Self {
        Self::start_with_clock(config, Arc::new(SystemClock)).await
    }

    pub async fn start_with_clock(config: FeedsConfig, clock: Arc<dyn Clock>) -> Self {
        let secrets = secrets();
        let feeds = bootstrap(&config, &secrets, clock).unwrap();
        let state = AppState {
            feeds: Arc::new(feeds),
            admin_api_key: secrets.admin_api_key.as_deref().map(Arc::from),
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let server = HttpServer::new(&config, state);
        let receiver = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, receiver).await;
        });

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        Self {
            addr,
            client,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.expect("service unreachable")
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
