mod api;
mod error;
mod state;
mod types;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;

pub use self::state::*;

/// Build the HTTP application.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/search", post(api::search_handler))
        .route("/count", get(api::count_handler))
        .route("/sync", post(api::sync_handler))
        .route("/clear", post(api::clear_handler))
        .layer(DefaultBodyLimit::disable())
        // upload limit: 10M
        .layer(RequestBodyLimitLayer::new(1024 * 1024 * 10))
        .with_state(state)
}
