//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Mount the admin API when enabled
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::FeedsConfig;
use crate::http::handlers;
use crate::lifecycle::{Feeds, ShutdownSignal};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub feeds: Arc<Feeds>,
    /// Bearer key for `/admin/*`; the admin API is not mounted without one.
    pub admin_api_key: Option<Arc<str>>,
}

/// HTTP server for the feeds service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &FeedsConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &FeedsConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/healthz", get(handlers::healthz))
            .route("/api/now-playing", get(handlers::now_playing))
            .route("/api/presence", get(handlers::presence))
            .route("/api/analytics", get(handlers::analytics))
            .route("/api/github", get(handlers::github))
            .route("/api/content/{collection}", get(handlers::content))
            .route("/api/checkout", post(handlers::checkout));

        if config.admin.enabled && state.admin_api_key.is_some() {
            router = router.merge(admin::router(state.clone()));
        }

        router.with_state(state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
                // Innermost: `Timeout` needs a `Default` body, which the limit's body is not.
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
