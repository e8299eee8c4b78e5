//! Admin API: feed status and cache inspection behind a bearer key.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use crate::http::server::AppState;
use self::auth::admin_auth_middleware;
use self::handlers::{get_cache, get_status};

/// Admin routes, still awaiting the application state.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/cache", get(get_cache))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
