use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Upper bound on a single remote request, so a hung fetch cannot stall an
/// ingestion batch forever.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request timed out")]
    Timeout,
    #[error("catalog request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("catalog returned HTTP {0}")]
    Status(u16),
    #[error("expected an image, got content type {0:?}")]
    NotAnImage(String),
    #[error("malformed catalog listing: {0}")]
    Listing(String),
}

/// One entry of the remote catalog listing. Missing `description` and
/// `category` default to empty strings; anything else malformed is a
/// per-item failure at the ingestion boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteImage {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub proxy_url: String,
    #[serde(default)]
    pub chroma_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    images: Vec<RemoteImage>,
}

/// A fetched binary image plus its declared content type.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// The remote catalog this engine mirrors. Implemented over HTTP in
/// production and in-memory in tests.
pub trait CatalogApi: Send + Sync {
    /// Full catalog listing in one call, no pagination.
    fn list_images(&self) -> impl Future<Output = Result<Vec<RemoteImage>, CatalogError>> + Send;

    /// Binary image behind a listing's `proxy_url`.
    fn fetch_image(
        &self,
        proxy_url: &str,
    ) -> impl Future<Output = Result<ImagePayload, CatalogError>> + Send;
}

/// reqwest-backed catalog client.
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(CatalogError::Network)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    /// Resolve a possibly-relative `proxy_url` against the API base.
    fn resolve(&self, proxy_url: &str) -> String {
        if proxy_url.starts_with("http://") || proxy_url.starts_with("https://") {
            proxy_url.to_string()
        } else {
            format!("{}/{}", self.base_url, proxy_url.trim_start_matches('/'))
        }
    }
}

fn classify(err: reqwest::Error) -> CatalogError {
    if err.is_timeout() { CatalogError::Timeout } else { CatalogError::Network(err) }
}

impl CatalogApi for HttpCatalog {
    async fn list_images(&self) -> Result<Vec<RemoteImage>, CatalogError> {
        let url = format!("{}/search/public/all", self.base_url);
        let response = self.client.get(url).send().await.map_err(classify)?;
        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status().as_u16()));
        }
        let listing: ListResponse =
            response.json().await.map_err(|e| CatalogError::Listing(e.to_string()))?;
        Ok(listing.images)
    }

    async fn fetch_image(&self, proxy_url: &str) -> Result<ImagePayload, CatalogError> {
        let url = self.resolve(proxy_url);
        let response = self.client.get(url).send().await.map_err(classify)?;
        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status().as_u16()));
        }
        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .unwrap_or_default()
            .trim()
            .to_string();
        let bytes = response.bytes().await.map_err(classify)?;
        Ok(ImagePayload { mime, bytes: bytes.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_joins_relative_urls() {
        let catalog = HttpCatalog::new("http://api.example/api/").unwrap();
        assert_eq!(catalog.resolve("/search/proxy/3"), "http://api.example/api/search/proxy/3");
        assert_eq!(catalog.resolve("search/proxy/3"), "http://api.example/api/search/proxy/3");
        assert_eq!(catalog.resolve("https://cdn.example/a.jpg"), "https://cdn.example/a.jpg");
    }

    #[test]
    fn listing_defaults_optional_fields() {
        let json = r#"{"images": [{"id": 1, "title": "t", "proxy_url": "/p/1"}]}"#;
        let listing: ListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(listing.images.len(), 1);
        assert_eq!(listing.images[0].description, "");
        assert_eq!(listing.images[0].chroma_id, None);
    }

    #[test]
    fn empty_listing_defaults_to_no_images() {
        let listing: ListResponse = serde_json::from_str("{}").unwrap();
        assert!(listing.images.is_empty());
    }
}
