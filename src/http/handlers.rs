//! Route handlers for the public data endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::feed::{Feed, Provider, ProviderId};
use crate::http::response::{error_response, not_configured, outcome_response};
use crate::http::server::AppState;
use crate::providers::{CheckoutRequest, ContentCollection};
use crate::resilience::with_deadline;

/// Resolve `key` on `feed` and render the outcome.
async fn serve<P: Provider>(id: ProviderId, feed: Option<&Feed<P>>, key: &P::Key) -> Response {
    match feed {
        Some(feed) => outcome_response(id, feed.resolve(key).await, feed.policy()),
        None => not_configured(id),
    }
}

pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn now_playing(State(state): State<AppState>) -> Response {
    serve(ProviderId::NowPlaying, state.feeds.now_playing.as_ref(), &()).await
}

pub async fn presence(State(state): State<AppState>) -> Response {
    serve(ProviderId::Presence, state.feeds.presence.as_ref(), &()).await
}

pub async fn analytics(State(state): State<AppState>) -> Response {
    serve(ProviderId::Analytics, state.feeds.analytics.as_ref(), &()).await
}

pub async fn github(State(state): State<AppState>) -> Response {
    serve(ProviderId::SourceControl, state.feeds.github.as_ref(), &()).await
}

pub async fn content(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Response {
    match collection.parse::<ContentCollection>() {
        Ok(collection) => {
            serve(ProviderId::Content, state.feeds.content.as_ref(), &collection).await
        }
        Err(e) => error_response(StatusCode::NOT_FOUND, &e.to_string()),
    }
}

pub async fn checkout(
    State(state): State<AppState>,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Response {
    let Some(client) = state.feeds.checkout.as_ref() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "checkout is not configured");
    };

    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected checkout body");
            return error_response(StatusCode::BAD_REQUEST, "invalid checkout request");
        }
    };
    if request.price_id.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "priceId is required");
    }

    let deadline = state.feeds.upstream_timeout;
    match with_deadline(deadline, client.create_session(&request)).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(error) => {
            tracing::warn!(
                provider = "checkout",
                kind = error.kind(),
                error = %error,
                "Checkout session creation failed"
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, error.public_message())
        }
    }
}
