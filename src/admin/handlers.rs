use axum::{extract::State, Json};
use serde::Serialize;

use crate::feed::{FeedInspect, ProviderId};
use crate::http::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub feeds: Vec<FeedState>,
    pub checkout_enabled: bool,
}

#[derive(Serialize)]
pub struct FeedState {
    pub provider: ProviderId,
    pub enabled: bool,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let feeds = ProviderId::ALL
        .into_iter()
        .map(|provider| FeedState {
            provider,
            enabled: state.feeds.is_enabled(provider),
        })
        .collect();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        feeds,
        checkout_enabled: state.feeds.checkout.is_some(),
    })
}

pub async fn get_cache(State(state): State<AppState>) -> Json<Vec<FeedInspect>> {
    Json(
        state
            .feeds
            .statuses()
            .into_iter()
            .map(|feed| feed.inspect())
            .collect(),
    )
}
