use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use image::{DynamicImage, ImageFormat, RgbImage};
use tempfile::TempDir;

use offsearch::catalog::{CatalogApi, CatalogError, ImagePayload, RemoteImage};
use offsearch::db::{self, CachedImage, Database};
use offsearch::service::OfflineSearch;

/// In-memory catalog standing in for the remote API.
#[derive(Default)]
struct MockCatalog {
    images: Vec<RemoteImage>,
    files: HashMap<String, ImagePayload>,
    broken: HashSet<String>,
    list_calls: AtomicUsize,
}

impl MockCatalog {
    fn add(&mut self, id: i64, data: Vec<u8>, mime: &str) {
        let proxy_url = format!("/search/proxy/{id}");
        self.images.push(RemoteImage {
            id,
            title: format!("image {id}"),
            description: String::new(),
            category: String::new(),
            proxy_url: proxy_url.clone(),
            chroma_id: None,
            created_at: None,
        });
        self.files.insert(proxy_url, ImagePayload { mime: mime.to_string(), bytes: data });
    }

    fn break_fetch(&mut self, id: i64) {
        self.broken.insert(format!("/search/proxy/{id}"));
    }

    fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

impl CatalogApi for MockCatalog {
    async fn list_images(&self) -> Result<Vec<RemoteImage>, CatalogError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.images.clone())
    }

    async fn fetch_image(&self, proxy_url: &str) -> Result<ImagePayload, CatalogError> {
        if self.broken.contains(proxy_url) {
            return Err(CatalogError::Status(500));
        }
        self.files.get(proxy_url).cloned().ok_or(CatalogError::Status(404))
    }
}

fn png(seed: u8) -> Vec<u8> {
    let img = RgbImage::from_fn(64, 64, |x, y| {
        let value = ((x * 4) as u16 + (y * 2) as u16 + seed as u16 * 37) % 256;
        image::Rgb([value as u8, (value / 2) as u8, seed])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

async fn open_db(dir: &TempDir) -> Result<Database> {
    Ok(db::init_db(dir.path().join("offsearch.db")).await?)
}

fn cached(id: i64, fingerprint: &str) -> CachedImage {
    CachedImage {
        id,
        title: format!("image {id}"),
        description: "d".to_string(),
        category: "c".to_string(),
        proxy_url: format!("/search/proxy/{id}"),
        chroma_id: None,
        fingerprint: fingerprint.to_string(),
        mime: "image/png".to_string(),
        image_data: vec![1, 2, 3],
        created_at: None,
    }
}

mod store {
    use super::*;
    use offsearch::db::crud;

    #[tokio::test]
    async fn fresh_store_is_empty() -> Result<()> {
        let dir = TempDir::new()?;
        let pool = open_db(&dir).await?;
        assert_eq!(crud::count(&pool).await?, 0);
        assert!(crud::get_all(&pool).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn upsert_overwrites_existing_id() -> Result<()> {
        let dir = TempDir::new()?;
        let pool = open_db(&dir).await?;

        crud::upsert_many(&pool, &[cached(1, "0000000000000000")]).await?;
        let mut updated = cached(1, "ffffffffffffffff");
        updated.title = "renamed".to_string();
        crud::upsert_many(&pool, &[updated]).await?;

        let all = crud::get_all(&pool).await?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "renamed");
        assert_eq!(all[0].fingerprint, "ffffffffffffffff");
        Ok(())
    }

    #[tokio::test]
    async fn get_all_round_trips_records() -> Result<()> {
        let dir = TempDir::new()?;
        let pool = open_db(&dir).await?;

        crud::upsert_many(&pool, &[cached(1, "00000000000000ff"), cached(2, "00000000000000f0")])
            .await?;

        let mut all = crud::get_all(&pool).await?;
        all.sort_by_key(|image| image.id);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, 1);
        assert_eq!(all[0].image_data, vec![1, 2, 3]);
        assert_eq!(all[1].fingerprint, "00000000000000f0");
        Ok(())
    }

    #[tokio::test]
    async fn clear_empties_the_store() -> Result<()> {
        let dir = TempDir::new()?;
        let pool = open_db(&dir).await?;

        crud::upsert_many(&pool, &[cached(1, "0000000000000000")]).await?;
        assert_eq!(crud::count(&pool).await?, 1);

        crud::clear(&pool).await?;
        assert_eq!(crud::count(&pool).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn reopening_the_store_keeps_records() -> Result<()> {
        let dir = TempDir::new()?;
        {
            let pool = open_db(&dir).await?;
            crud::upsert_many(&pool, &[cached(7, "0123456789abcdef")]).await?;
            pool.close().await;
        }
        let pool = open_db(&dir).await?;
        assert_eq!(crud::count(&pool).await?, 1);
        Ok(())
    }
}

mod pipeline {
    use super::*;
    use offsearch::db::crud;

    #[tokio::test]
    async fn initialize_mirrors_the_whole_catalog() -> Result<()> {
        let dir = TempDir::new()?;
        let mut catalog = MockCatalog::default();
        // 25 items: 3 batches of 10 + 10 + 5
        for id in 1..=25 {
            catalog.add(id, png(id as u8), "image/png");
        }

        let service = OfflineSearch::new(open_db(&dir).await?, catalog);
        service.initialize().await?;

        assert_eq!(service.cached_image_count().await?, 25);
        Ok(())
    }

    #[tokio::test]
    async fn fingerprints_are_persisted_with_fixed_length() -> Result<()> {
        let dir = TempDir::new()?;
        let pool = open_db(&dir).await?;
        let mut catalog = MockCatalog::default();
        for id in 1..=3 {
            catalog.add(id, png(id as u8), "image/png");
        }

        let service = OfflineSearch::new(pool.clone(), catalog);
        service.initialize().await?;

        for image in crud::get_all(&pool).await? {
            assert_eq!(image.fingerprint.len(), 16);
            assert!(image.fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
        }
        Ok(())
    }

    #[tokio::test]
    async fn failed_items_are_skipped_not_fatal() -> Result<()> {
        let dir = TempDir::new()?;
        let mut catalog = MockCatalog::default();
        for id in 1..=5 {
            catalog.add(id, png(id as u8), "image/png");
        }
        catalog.break_fetch(3);

        let service = OfflineSearch::new(open_db(&dir).await?, catalog);
        service.initialize().await?;

        assert_eq!(service.cached_image_count().await?, 4);
        Ok(())
    }

    #[tokio::test]
    async fn non_image_and_undecodable_payloads_are_skipped() -> Result<()> {
        let dir = TempDir::new()?;
        let mut catalog = MockCatalog::default();
        catalog.add(1, png(1), "image/png");
        catalog.add(2, b"<html>not found</html>".to_vec(), "text/html");
        catalog.add(3, b"truncated garbage".to_vec(), "image/png");

        let service = OfflineSearch::new(open_db(&dir).await?, catalog);
        service.initialize().await?;

        assert_eq!(service.cached_image_count().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_initialize_runs_the_pipeline_once() -> Result<()> {
        let dir = TempDir::new()?;
        let mut catalog = MockCatalog::default();
        for id in 1..=12 {
            catalog.add(id, png(id as u8), "image/png");
        }

        let service = OfflineSearch::new(open_db(&dir).await?, catalog);
        let (a, b) = tokio::join!(service.initialize(), service.initialize());
        a?;
        b?;

        // the spy would show 2 if both callers had started a run
        assert_eq!(service.api().list_calls(), 1);
        assert_eq!(service.cached_image_count().await?, 12);
        Ok(())
    }

    #[tokio::test]
    async fn populated_store_skips_the_remote_listing() -> Result<()> {
        let dir = TempDir::new()?;
        let pool = open_db(&dir).await?;

        let mut catalog = MockCatalog::default();
        catalog.add(1, png(1), "image/png");
        let service = OfflineSearch::new(pool.clone(), catalog);
        service.initialize().await?;

        // a fresh service over the same store must trust the record count
        let service = OfflineSearch::new(pool, MockCatalog::default());
        service.initialize().await?;
        assert_eq!(service.api().list_calls(), 0);
        Ok(())
    }
}

mod search {
    use super::*;

    #[tokio::test]
    async fn identical_query_ranks_first_with_distance_zero() -> Result<()> {
        let dir = TempDir::new()?;
        let mut catalog = MockCatalog::default();
        catalog.add(1, png(1), "image/png");
        catalog.add(2, png(90), "image/png");
        catalog.add(3, png(200), "image/png");

        let service = OfflineSearch::new(open_db(&dir).await?, catalog);
        let results = service.search(png(1), 64, 20).await?;

        assert!(!results.is_empty());
        assert_eq!(results[0].id, 1);
        assert_eq!(results[0].distance, 0);
        Ok(())
    }

    #[tokio::test]
    async fn search_triggers_initialization() -> Result<()> {
        let dir = TempDir::new()?;
        let mut catalog = MockCatalog::default();
        catalog.add(1, png(1), "image/png");

        let service = OfflineSearch::new(open_db(&dir).await?, catalog);
        service.search(png(1), 64, 20).await?;

        assert_eq!(service.api().list_calls(), 1);
        assert_eq!(service.cached_image_count().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_query_aborts_the_search() -> Result<()> {
        let dir = TempDir::new()?;
        let mut catalog = MockCatalog::default();
        catalog.add(1, png(1), "image/png");

        let service = OfflineSearch::new(open_db(&dir).await?, catalog);
        assert!(service.search(Vec::new(), 64, 20).await.is_err());
        assert!(service.search(b"not an image".to_vec(), 64, 20).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn clear_resets_state_and_search_reingests() -> Result<()> {
        let dir = TempDir::new()?;
        let mut catalog = MockCatalog::default();
        catalog.add(1, png(1), "image/png");

        let service = OfflineSearch::new(open_db(&dir).await?, catalog);
        service.initialize().await?;
        assert_eq!(service.api().list_calls(), 1);

        service.clear_cache().await?;

        let results = service.search(png(1), 64, 20).await?;
        assert_eq!(service.api().list_calls(), 2);
        assert_eq!(results[0].id, 1);
        Ok(())
    }
}
