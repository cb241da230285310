//! Offline song records and their metadata projection.

use crate::error::{OfflineStoreError, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::fmt;

// =============================================================================
// Records
// =============================================================================

/// One offline song: metadata plus the encoded audio payload.
///
/// Saving a record with an `id` that already exists replaces every field,
/// including the payload.
#[derive(Clone, PartialEq, Eq)]
pub struct OfflineSongRecord {
    /// Song identifier, unique across the store
    pub id: String,
    /// Song title
    pub title: String,
    /// Performing artist
    pub artist: Option<String>,
    /// Remote or cached cover image reference (not stored by this crate)
    pub cover_url: Option<String>,
    /// Playback duration in milliseconds
    pub duration_ms: Option<i64>,
    /// Container/codec label of the payload, e.g. `audio/mpeg`
    pub mime_type: Option<String>,
    /// Download time in epoch milliseconds, used for recency ordering
    pub downloaded_at: i64,
    /// Encoded audio content
    pub payload: Bytes,
}

impl OfflineSongRecord {
    /// Create a record stamped with the current time as `downloaded_at`.
    pub fn new(id: impl Into<String>, title: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: None,
            cover_url: None,
            duration_ms: None,
            mime_type: None,
            downloaded_at: chrono::Utc::now().timestamp_millis(),
            payload: payload.into(),
        }
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_cover_url(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = Some(cover_url.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Override the download timestamp (epoch milliseconds).
    pub fn with_downloaded_at(mut self, downloaded_at: i64) -> Self {
        self.downloaded_at = downloaded_at;
        self
    }

    /// Metadata view of this record, without the payload.
    pub fn meta(&self) -> OfflineSongMeta {
        OfflineSongMeta {
            id: self.id.clone(),
            title: self.title.clone(),
            artist: self.artist.clone(),
            cover_url: self.cover_url.clone(),
            duration_ms: self.duration_ms,
            mime_type: self.mime_type.clone(),
            downloaded_at: self.downloaded_at,
        }
    }

    /// Check the record can be written: offline records must carry audio content.
    ///
    /// Every other field value, including an empty title or a negative
    /// timestamp, is stored and returned exactly as given.
    pub fn validate(&self) -> Result<()> {
        if self.payload.is_empty() {
            return Err(OfflineStoreError::invalid_input(
                "payload",
                "offline records must carry audio content",
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for OfflineSongRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OfflineSongRecord")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("artist", &self.artist)
            .field("cover_url", &self.cover_url)
            .field("duration_ms", &self.duration_ms)
            .field("mime_type", &self.mime_type)
            .field("downloaded_at", &self.downloaded_at)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl<'r> FromRow<'r, SqliteRow> for OfflineSongRecord {
    fn from_row(row: &'r SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let payload: Vec<u8> = row.try_get("payload")?;

        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            artist: row.try_get("artist")?,
            cover_url: row.try_get("cover_url")?,
            duration_ms: row.try_get("duration_ms")?,
            mime_type: row.try_get("mime_type")?,
            downloaded_at: row.try_get("downloaded_at")?,
            payload: Bytes::from(payload),
        })
    }
}

/// Metadata of an offline song, as returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OfflineSongMeta {
    pub id: String,
    pub title: String,
    pub artist: Option<String>,
    pub cover_url: Option<String>,
    pub duration_ms: Option<i64>,
    pub mime_type: Option<String>,
    pub downloaded_at: i64,
}

// =============================================================================
// Statistics
// =============================================================================

/// Aggregate view of the store contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineStoreStats {
    /// Number of stored songs
    pub song_count: u64,
    /// Sum of all payload sizes in bytes
    pub total_payload_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nightcall() -> OfflineSongRecord {
        OfflineSongRecord::new("s1", "Nightcall", vec![0u8; 17])
            .with_artist("Kavinsky")
            .with_duration_ms(255_000)
            .with_mime_type("audio/mpeg")
            .with_downloaded_at(1000)
    }

    #[test]
    fn test_new_stamps_current_time() {
        let before = chrono::Utc::now().timestamp_millis();
        let record = OfflineSongRecord::new("s1", "Nightcall", vec![1u8]);
        let after = chrono::Utc::now().timestamp_millis();

        assert!(record.downloaded_at >= before && record.downloaded_at <= after);
        assert!(record.artist.is_none());
    }

    #[test]
    fn test_meta_drops_payload() {
        let record = nightcall();
        let meta = record.meta();

        assert_eq!(meta.id, "s1");
        assert_eq!(meta.title, "Nightcall");
        assert_eq!(meta.artist.as_deref(), Some("Kavinsky"));
        assert_eq!(meta.duration_ms, Some(255_000));
        assert_eq!(meta.downloaded_at, 1000);
    }

    #[test]
    fn test_meta_serializes_camel_case_without_payload() {
        let json = serde_json::to_value(nightcall().meta()).unwrap();

        assert_eq!(json["durationMs"], 255_000);
        assert_eq!(json["mimeType"], "audio/mpeg");
        assert_eq!(json["downloadedAt"], 1000);
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn test_validate() {
        assert!(nightcall().validate().is_ok());

        let mut empty_payload = nightcall();
        empty_payload.payload = Bytes::new();
        assert!(matches!(
            empty_payload.validate(),
            Err(OfflineStoreError::InvalidInput { ref field, .. }) if field == "payload"
        ));

        let mut odd_but_legal = nightcall().with_duration_ms(-3).with_downloaded_at(-1);
        odd_but_legal.id = " ".to_string();
        odd_but_legal.title = String::new();
        assert!(odd_but_legal.validate().is_ok());
    }

    #[test]
    fn test_debug_hides_payload_bytes() {
        let debug = format!("{:?}", nightcall());
        assert!(debug.contains("payload_len: 17"));
        assert!(!debug.contains("[0, 0"));
    }
}
