use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use sqlx::FromRow;

/// One catalog image mirrored into the local store.
///
/// Metadata is copied verbatim from the remote catalog at ingestion time and
/// never refreshed afterwards; `clear` plus a new sync is the only way to
/// pick up remote changes.
#[derive(Debug, Clone, FromRow)]
pub struct CachedImage {
    /// Remote catalog image id, primary key.
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Opaque reference used to refetch the binary from the remote system.
    /// Not reachable offline, retained for display and linking.
    pub proxy_url: String,
    /// Optional external correlation id, passthrough.
    pub chroma_id: Option<String>,
    /// 16 lowercase hex characters encoding the 64-bit perceptual hash.
    pub fingerprint: String,
    /// Declared content type of `image_data`.
    pub mime: String,
    /// Full raster payload, so results can render fully offline.
    pub image_data: Vec<u8>,
    pub created_at: Option<String>,
}

/// A search hit: a projection of [`CachedImage`] plus the hamming distance
/// from the query fingerprint. Produced fresh per query, never stored.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub proxy_url: String,
    pub distance: u32,
    pub mime: String,
    pub image_data: Vec<u8>,
}

impl SearchResult {
    pub fn from_cached(image: CachedImage, distance: u32) -> Self {
        Self {
            id: image.id,
            title: image.title,
            description: image.description,
            category: image.category,
            proxy_url: image.proxy_url,
            distance,
            mime: image.mime,
            image_data: image.image_data,
        }
    }

    /// Payload as a self-describing `data:` URI, renderable offline.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.image_data))
    }
}

impl Serialize for SearchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_struct("SearchResult", 7)?;
        row.serialize_field("id", &self.id)?;
        row.serialize_field("title", &self.title)?;
        row.serialize_field("description", &self.description)?;
        row.serialize_field("category", &self.category)?;
        row.serialize_field("proxy_url", &self.proxy_url)?;
        row.serialize_field("distance", &self.distance)?;
        row.serialize_field("image_data", &self.data_uri())?;
        row.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_result_serializes_payload_as_data_uri() {
        let result = SearchResult {
            id: 7,
            title: "t".to_string(),
            description: String::new(),
            category: String::new(),
            proxy_url: "/p/7".to_string(),
            distance: 3,
            mime: "image/png".to_string(),
            image_data: vec![1, 2, 3],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["distance"], 3);
        assert_eq!(json["image_data"], "data:image/png;base64,AQID");
    }
}
