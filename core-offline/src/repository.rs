//! Repository trait for offline song storage.

use crate::error::Result;
use crate::models::{OfflineSongMeta, OfflineSongRecord, OfflineStoreStats};

/// Storage contract consumed by download, playback and listing collaborators.
///
/// Every method runs in its own transaction. A missing id is reported as
/// `Ok(None)` / `Ok(false)`, never as an error.
#[async_trait::async_trait]
pub trait OfflineMediaRepository: Send + Sync {
    /// Store a record, replacing any existing record with the same id.
    async fn save(&self, record: OfflineSongRecord) -> Result<()>;

    /// Fetch a full record, payload included.
    async fn get(&self, id: &str) -> Result<Option<OfflineSongRecord>>;

    /// Fetch a record's metadata without its payload.
    async fn get_meta(&self, id: &str) -> Result<Option<OfflineSongMeta>>;

    /// Whether a record exists for `id`.
    async fn has(&self, id: &str) -> Result<bool>;

    /// All records, most recently downloaded first, without payloads.
    async fn list(&self) -> Result<Vec<OfflineSongMeta>>;

    /// Remove a record. Returns `false` when nothing was stored under `id`.
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Record count and total payload size.
    async fn stats(&self) -> Result<OfflineStoreStats>;
}
