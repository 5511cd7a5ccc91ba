use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::phash::PhashError;
use crate::service::SearchError;

pub type Result<T> = std::result::Result<T, AppError>;

/// API error type. Search failures surface as descriptive error responses,
/// never as an empty result list, so "no matches" and "search failed" stay
/// distinguishable for clients.
pub struct AppError(pub SearchError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SearchError::Fingerprint(PhashError::Worker(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            SearchError::Fingerprint(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SearchError::Catalog(_) => StatusCode::BAD_GATEWAY,
            SearchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, format!("search failed: {}", self.0)).into_response()
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        Self(err)
    }
}
