use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum_typed_multipart::TypedMultipart;
use log::info;

use super::error::Result;
use super::state::AppState;
use super::types::*;
use crate::service::{DEFAULT_LIMIT, DEFAULT_MAX_DISTANCE};

/// Search the local cache with an uploaded query image.
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    data: TypedMultipart<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let max_distance = data.max_distance.unwrap_or(DEFAULT_MAX_DISTANCE);
    let limit = data.limit.unwrap_or(DEFAULT_LIMIT);

    let start = Instant::now();
    let result = state.service.search(data.file.to_vec(), max_distance, limit).await?;
    info!("search returned {} matches in {:?}", result.len(), start.elapsed());

    Ok(Json(SearchResponse { time: start.elapsed().as_millis(), result }))
}

/// Number of cached images, triggering a catalog sync on first use.
pub async fn count_handler(State(state): State<Arc<AppState>>) -> Result<Json<CountResponse>> {
    let count = state.service.cached_image_count().await?;
    Ok(Json(CountResponse { count }))
}

/// Mirror the remote catalog now instead of on the first search.
pub async fn sync_handler(State(state): State<Arc<AppState>>) -> Result<Json<CountResponse>> {
    state.service.initialize().await?;
    let count = state.service.cached_image_count().await?;
    Ok(Json(CountResponse { count }))
}

/// Drop every cached image; the next request repopulates the cache.
pub async fn clear_handler(State(state): State<Arc<AppState>>) -> Result<()> {
    state.service.clear_cache().await?;
    Ok(())
}
