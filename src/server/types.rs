use axum::body::Bytes;
use axum_typed_multipart::TryFromMultipart;
use serde::Serialize;

use crate::db::SearchResult;

/// Multipart search request: the query image plus optional ranking knobs.
#[derive(TryFromMultipart)]
pub struct SearchRequest {
    pub file: Bytes,
    pub max_distance: Option<u32>,
    pub limit: Option<usize>,
}

/// Search response.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// Elapsed milliseconds.
    pub time: u128,
    pub result: Vec<SearchResult>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}
