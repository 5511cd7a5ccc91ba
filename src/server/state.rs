use std::sync::Arc;

use crate::catalog::HttpCatalog;
use crate::service::OfflineSearch;

/// Application state.
pub struct AppState {
    /// The shared search service; its own locking makes concurrent
    /// handlers safe.
    pub service: OfflineSearch<HttpCatalog>,
}

impl AppState {
    pub fn new(service: OfflineSearch<HttpCatalog>) -> Arc<Self> {
        Arc::new(AppState { service })
    }
}
