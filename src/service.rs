use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::catalog::{CatalogApi, CatalogError, RemoteImage};
use crate::db::{CachedImage, Database, SearchResult, crud};
use crate::phash::PhashError;
use crate::{hamming, phash};

/// Catalog items mirrored per batch. Batches run sequentially; the items of
/// one batch are fetched and fingerprinted concurrently.
pub const BATCH_SIZE: usize = 10;
/// Pause between batches, yielding to concurrent readers.
pub const BATCH_PAUSE: Duration = Duration::from_millis(50);
pub const DEFAULT_MAX_DISTANCE: u32 = 30;
pub const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Fingerprint(#[from] PhashError),
    #[error("catalog request failed: {0}")]
    Catalog(#[from] CatalogError),
    #[error("image store failure: {0}")]
    Store(#[from] sqlx::Error),
}

/// Offline similarity search over a locally mirrored image catalog.
///
/// The first call that needs the cache triggers a one-time ingestion run
/// mirroring the remote catalog; every later query runs entirely offline
/// against the local store.
pub struct OfflineSearch<C> {
    db: Database,
    api: C,
    /// Guards the one-shot ingestion: the flag is only read or written with
    /// the lock held, so concurrent callers block on an in-flight run
    /// instead of starting a second one.
    initialized: Mutex<bool>,
}

impl<C: CatalogApi> OfflineSearch<C> {
    pub fn new(db: Database, api: C) -> Self {
        Self { db, api, initialized: Mutex::new(false) }
    }

    pub fn api(&self) -> &C {
        &self.api
    }

    /// Idempotent lazy initialization. At most one ingestion run per
    /// instance; callers arriving during a run wait for it to finish.
    pub async fn initialize(&self) -> Result<(), SearchError> {
        let mut initialized = self.initialized.lock().await;
        if *initialized {
            return Ok(());
        }
        self.ensure_populated().await?;
        *initialized = true;
        Ok(())
    }

    /// Mirror the remote catalog unless the store already holds images.
    ///
    /// The record count is the sole "already ingested" signal; stale
    /// metadata is never refreshed automatically, an explicit
    /// [`clear_cache`](Self::clear_cache) plus a new run is required.
    async fn ensure_populated(&self) -> Result<(), SearchError> {
        let cached = crud::count(&self.db).await?;
        if cached > 0 {
            debug!("store already holds {cached} images, skipping catalog sync");
            return Ok(());
        }

        let listing = self.api.list_images().await?;
        info!("mirroring {} catalog images", listing.len());

        let mut stored = 0usize;
        for (batch_index, batch) in listing.chunks(BATCH_SIZE).enumerate() {
            let ingested =
                futures::future::join_all(batch.iter().map(|image| self.ingest_one(image))).await;
            let images: Vec<CachedImage> = ingested.into_iter().flatten().collect();

            if !images.is_empty() {
                crud::upsert_many(&self.db, &images).await?;
                stored += images.len();
            }
            debug!("batch {}: stored {} of {} items", batch_index + 1, images.len(), batch.len());

            if (batch_index + 1) * BATCH_SIZE < listing.len() {
                tokio::time::sleep(BATCH_PAUSE).await;
            }
        }

        info!("catalog sync finished: {stored} of {} images cached", listing.len());
        Ok(())
    }

    /// Mirror one catalog item. Failures are logged and the item is
    /// dropped; they never abort the batch or the pipeline.
    async fn ingest_one(&self, image: &RemoteImage) -> Option<CachedImage> {
        match self.try_ingest(image).await {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!("skipping image {}: {e}", image.id);
                None
            }
        }
    }

    async fn try_ingest(&self, image: &RemoteImage) -> Result<CachedImage, SearchError> {
        let payload = self.api.fetch_image(&image.proxy_url).await?;
        if !payload.mime.starts_with("image/") {
            return Err(CatalogError::NotAnImage(payload.mime).into());
        }

        let fingerprint = phash::compute_with_timeout(payload.bytes.clone()).await?;

        Ok(CachedImage {
            id: image.id,
            title: image.title.clone(),
            description: image.description.clone(),
            category: image.category.clone(),
            proxy_url: image.proxy_url.clone(),
            chroma_id: image.chroma_id.clone(),
            fingerprint: fingerprint.into_hex(),
            mime: payload.mime,
            image_data: payload.bytes,
            created_at: image.created_at.clone(),
        })
    }

    /// Rank cached images by hamming distance to the query image.
    ///
    /// Triggers [`initialize`](Self::initialize) if it has not run yet, so
    /// the first search on a cold store pays for a full catalog sync. A
    /// failure to fingerprint the query or to read the store aborts the
    /// whole call; there are no partial results.
    pub async fn search(
        &self,
        query: Vec<u8>,
        max_distance: u32,
        limit: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.initialize().await?;

        let fingerprint = phash::compute_with_timeout(query).await?;
        let images = crud::get_all(&self.db).await?;
        Ok(rank(fingerprint.as_hex(), images, max_distance, limit))
    }

    /// Number of cached images, triggering initialization if needed.
    pub async fn cached_image_count(&self) -> Result<i64, SearchError> {
        self.initialize().await?;
        Ok(crud::count(&self.db).await?)
    }

    /// Empty the store and reset to uninitialized: the next call that needs
    /// the cache re-runs the ingestion pipeline.
    pub async fn clear_cache(&self) -> Result<(), SearchError> {
        let mut initialized = self.initialized.lock().await;
        crud::clear(&self.db).await?;
        *initialized = false;
        Ok(())
    }
}

/// Distance-rank a full store scan against a query fingerprint: keep
/// records within `max_distance`, sort ascending by distance with ascending
/// id as the tie break, truncate to `limit`.
///
/// Records with an incomparable fingerprint rank at [`hamming::MISMATCH`]
/// and are excluded by any sane cutoff.
pub fn rank(
    query: &str,
    images: Vec<CachedImage>,
    max_distance: u32,
    limit: usize,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = images
        .into_iter()
        .filter_map(|image| {
            let distance = hamming::hex_distance(query, &image.fingerprint);
            (distance <= max_distance).then(|| SearchResult::from_cached(image, distance))
        })
        .collect();
    results.sort_by_key(|result| (result.distance, result.id));
    results.truncate(limit);
    results
}
