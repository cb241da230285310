//! SQLite-backed offline media store.

use crate::config::OfflineStoreConfig;
use crate::db;
use crate::error::{OfflineStoreError, Result};
use crate::models::{OfflineSongMeta, OfflineSongRecord, OfflineStoreStats};
use crate::repository::OfflineMediaRepository;
use sqlx::SqlitePool;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument, warn};

const META_COLUMNS: &str =
    "id, title, artist, cover_url, duration_ms, mime_type, downloaded_at";

/// Durable store of offline songs keyed by song id.
///
/// Cloning is cheap; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct OfflineMediaStore {
    pool: SqlitePool,
}

impl OfflineMediaStore {
    /// Open (creating if needed) the database described by `config` and bring
    /// its schema up to date.
    pub async fn open(config: OfflineStoreConfig) -> Result<Self> {
        let pool = db::create_pool(&config).await?;
        Ok(Self { pool })
    }

    /// Wrap an already migrated pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Raw pool access for tests; writes through it skip record validation.
    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Store `record`, atomically replacing any record with the same id.
    #[instrument(skip(self, record), fields(id = %record.id, bytes = record.payload.len()))]
    pub async fn save(&self, record: OfflineSongRecord) -> Result<()> {
        record.validate()?;

        let mut tx = self.pool.begin().await?;

        let written = sqlx::query(
            r#"
            INSERT INTO offline_songs (
                id, title, artist, cover_url, duration_ms, mime_type, downloaded_at, payload
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                artist = excluded.artist,
                cover_url = excluded.cover_url,
                duration_ms = excluded.duration_ms,
                mime_type = excluded.mime_type,
                downloaded_at = excluded.downloaded_at,
                payload = excluded.payload
            "#,
        )
        .bind(&record.id)
        .bind(&record.title)
        .bind(&record.artist)
        .bind(&record.cover_url)
        .bind(record.duration_ms)
        .bind(&record.mime_type)
        .bind(record.downloaded_at)
        .bind(record.payload.as_ref())
        .execute(&mut *tx)
        .await;

        if let Err(e) = written {
            error!(error = %e, "Failed to write offline song");
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback after failed write also failed");
            }
            return Err(OfflineStoreError::Storage(e));
        }

        tx.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit offline song");
            e
        })?;

        info!(downloaded_at = record.downloaded_at, "Saved offline song");
        Ok(())
    }

    /// Fetch the full record for `id`, or `None` when it is not stored.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<OfflineSongRecord>> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, OfflineSongRecord>(&format!(
            "SELECT {META_COLUMNS}, payload FROM offline_songs WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to read offline song");
            e
        })?;

        tx.commit().await?;

        debug!(found = record.is_some(), "Looked up offline song");
        Ok(record)
    }

    /// Fetch the metadata for `id` without loading the payload.
    #[instrument(skip(self))]
    pub async fn get_meta(&self, id: &str) -> Result<Option<OfflineSongMeta>> {
        let meta = sqlx::query_as::<_, OfflineSongMeta>(&format!(
            "SELECT {META_COLUMNS} FROM offline_songs WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to read offline song metadata");
            e
        })?;

        Ok(meta)
    }

    /// Whether a record exists for `id`. Only the primary key index is read.
    #[instrument(skip(self))]
    pub async fn has(&self, id: &str) -> Result<bool> {
        let (exists,): (i64,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM offline_songs WHERE id = ?)")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    warn!(error = %e, "Failed to check offline song");
                    e
                })?;

        Ok(exists != 0)
    }

    /// Snapshot of every record's metadata, most recently downloaded first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<OfflineSongMeta>> {
        let mut tx = self.pool.begin().await?;

        let songs = sqlx::query_as::<_, OfflineSongMeta>(&format!(
            "SELECT {META_COLUMNS} FROM offline_songs ORDER BY downloaded_at DESC, id ASC"
        ))
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list offline songs");
            e
        })?;

        tx.commit().await?;

        debug!(count = songs.len(), "Listed offline songs");
        Ok(songs)
    }

    /// Remove the record for `id`. Removing an unknown id succeeds and returns `false`.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM offline_songs WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await;

        let removed = match result {
            Ok(done) => done.rows_affected() > 0,
            Err(e) => {
                error!(error = %e, "Failed to delete offline song");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed delete also failed");
                }
                return Err(OfflineStoreError::Storage(e));
            }
        };

        tx.commit().await?;

        debug!(removed, "Deleted offline song");
        Ok(removed)
    }

    /// Record count and total payload bytes.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<OfflineStoreStats> {
        let (song_count, total_payload_bytes): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(length(payload)), 0) FROM offline_songs",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(OfflineStoreStats {
            song_count: song_count as u64,
            total_payload_bytes: total_payload_bytes as u64,
        })
    }

    /// Close every pooled connection. Later operations fail with a storage error.
    pub async fn close(&self) {
        info!("Closing offline media store");
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl OfflineMediaRepository for OfflineMediaStore {
    async fn save(&self, record: OfflineSongRecord) -> Result<()> {
        OfflineMediaStore::save(self, record).await
    }

    async fn get(&self, id: &str) -> Result<Option<OfflineSongRecord>> {
        OfflineMediaStore::get(self, id).await
    }

    async fn get_meta(&self, id: &str) -> Result<Option<OfflineSongMeta>> {
        OfflineMediaStore::get_meta(self, id).await
    }

    async fn has(&self, id: &str) -> Result<bool> {
        OfflineMediaStore::has(self, id).await
    }

    async fn list(&self) -> Result<Vec<OfflineSongMeta>> {
        OfflineMediaStore::list(self).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        OfflineMediaStore::delete(self, id).await
    }

    async fn stats(&self) -> Result<OfflineStoreStats> {
        OfflineMediaStore::stats(self).await
    }
}

// =============================================================================
// Process-wide handle
// =============================================================================

/// Lazily opened, process-wide [`OfflineMediaStore`].
///
/// The first call to [`get_or_open`](Self::get_or_open) opens the database and
/// runs migrations; concurrent and later callers wait for and reuse that
/// handle. A failed open is not cached, so the next call tries again.
///
/// ```rust,ignore
/// static OFFLINE: OnceLock<SharedOfflineMediaStore> = OnceLock::new();
///
/// let shared = OFFLINE.get_or_init(|| SharedOfflineMediaStore::new(OfflineStoreConfig::in_dir(dir)));
/// let store = shared.get_or_open().await?;
/// ```
#[derive(Debug)]
pub struct SharedOfflineMediaStore {
    config: OfflineStoreConfig,
    store: OnceCell<OfflineMediaStore>,
}

impl SharedOfflineMediaStore {
    pub fn new(config: OfflineStoreConfig) -> Self {
        Self {
            config,
            store: OnceCell::new(),
        }
    }

    /// The opened store, opening it on first use.
    pub async fn get_or_open(&self) -> Result<&OfflineMediaStore> {
        self.store
            .get_or_try_init(|| async {
                debug!("Initializing shared offline media store");
                OfflineMediaStore::open(self.config.clone()).await
            })
            .await
    }

    /// The store if it has already been opened.
    pub fn get(&self) -> Option<&OfflineMediaStore> {
        self.store.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    async fn create_test_store() -> OfflineMediaStore {
        OfflineMediaStore::open(OfflineStoreConfig::in_memory())
            .await
            .unwrap()
    }

    fn song(id: &str, downloaded_at: i64) -> OfflineSongRecord {
        OfflineSongRecord::new(id, format!("Song {}", id), vec![7u8; 32])
            .with_downloaded_at(downloaded_at)
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let store = create_test_store().await;
        let record = song("a", 100).with_artist("Artist").with_mime_type("audio/flac");

        store.save(record.clone()).await.unwrap();

        let loaded = store.get("a").await.unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = create_test_store().await;
        assert!(store.get("missing").await.unwrap().is_none());
        assert!(store.get_meta("missing").await.unwrap().is_none());
        assert!(!store.has("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_rejects_empty_payload() {
        let store = create_test_store().await;
        let record = OfflineSongRecord::new("a", "Song", Bytes::new());

        let err = store.save(record).await.unwrap_err();
        assert!(matches!(err, OfflineStoreError::InvalidInput { .. }));
        assert!(!store.has("a").await.unwrap());
    }

    #[tokio::test]
    async fn test_schema_rejects_empty_payload() {
        let store = create_test_store().await;

        let result = sqlx::query(
            "INSERT INTO offline_songs (id, title, downloaded_at, payload) VALUES ('x', 'X', 1, x'')",
        )
        .execute(store.pool())
        .await;

        assert!(result.is_err(), "CHECK constraint should reject empty payloads");
    }

    #[tokio::test]
    async fn test_get_meta_and_stats() {
        let store = create_test_store().await;
        store.save(song("a", 100)).await.unwrap();
        store.save(song("b", 200)).await.unwrap();

        let meta = store.get_meta("b").await.unwrap().unwrap();
        assert_eq!(meta, song("b", 200).meta());

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.song_count, 2);
        assert_eq!(stats.total_payload_bytes, 64);
    }

    #[tokio::test]
    async fn test_delete_reports_removal() {
        let store = create_test_store().await;
        store.save(song("a", 100)).await.unwrap();

        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert_eq!(store.stats().await.unwrap(), OfflineStoreStats::default());
    }

    #[tokio::test]
    async fn test_closed_store_fails_with_storage_error() {
        let store = create_test_store().await;
        store.close().await;

        let err = store.has("a").await.unwrap_err();
        assert!(err.is_storage_failure());
    }

    #[tokio::test]
    async fn test_shared_store_opens_once() {
        let shared = SharedOfflineMediaStore::new(OfflineStoreConfig::in_memory());
        assert!(shared.get().is_none());

        let (first, second) = tokio::join!(shared.get_or_open(), shared.get_or_open());
        let first = first.unwrap();
        let second = second.unwrap();

        assert!(std::ptr::eq(first, second));
        first.save(song("a", 1)).await.unwrap();
        assert!(second.has("a").await.unwrap());
    }
}
