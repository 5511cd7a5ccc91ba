use sqlx::{Result, SqlitePool};

use super::model::CachedImage;

/// Number of cached images. This count is the sole "already ingested"
/// signal: zero means a sync must run before the store is ready.
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM image").fetch_one(pool).await?;
    Ok(count)
}

/// Write a batch of images in one transaction. Re-ingesting an existing id
/// overwrites the prior record. All rows become visible together or the
/// whole call fails.
pub async fn upsert_many(pool: &SqlitePool, images: &[CachedImage]) -> Result<()> {
    let mut tx = pool.begin().await?;
    for image in images {
        sqlx::query(
            r#"
            INSERT INTO image (id, title, description, category, proxy_url, chroma_id,
                               fingerprint, mime, image_data, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                category = excluded.category,
                proxy_url = excluded.proxy_url,
                chroma_id = excluded.chroma_id,
                fingerprint = excluded.fingerprint,
                mime = excluded.mime,
                image_data = excluded.image_data,
                created_at = excluded.created_at
            "#,
        )
        .bind(image.id)
        .bind(&image.title)
        .bind(&image.description)
        .bind(&image.category)
        .bind(&image.proxy_url)
        .bind(&image.chroma_id)
        .bind(&image.fingerprint)
        .bind(&image.mime)
        .bind(&image.image_data)
        .bind(&image.created_at)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Full scan of the cache. No ordering guarantee, callers sort.
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<CachedImage>> {
    sqlx::query_as(
        "SELECT id, title, description, category, proxy_url, chroma_id, fingerprint, \
         mime, image_data, created_at FROM image",
    )
    .fetch_all(pool)
    .await
}

/// Delete every cached image. Afterwards `count` is zero and callers must
/// treat the store as uninitialized.
pub async fn clear(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM image").execute(pool).await?;
    Ok(())
}
