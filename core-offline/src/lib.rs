//! # Offline Media Store
//!
//! Persistent storage for songs downloaded for offline playback.
//!
//! ## Overview
//!
//! Each record pairs the encoded audio payload with its metadata (title,
//! artist, cover reference, duration, MIME type, download time) and is keyed
//! by song id. The store supports:
//! - Atomic save with full replace on an existing id
//! - Point lookup, metadata-only lookup and a cheap existence check
//! - Listing by recency (newest download first) without loading payloads
//! - Idempotent deletion
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │     OfflineMediaStore                  │
//! │  - save() / get() / has()              │
//! │  - list() / delete() / stats()         │
//! └────────┬───────────────────────────────┘
//!          │
//!          └──> SqlitePool (WAL, migrations, optional quota)
//!                 └──> offline_songs (PK id, index downloaded_at DESC)
//! ```
//!
//! Download, playback and listing collaborators depend on the
//! [`OfflineMediaRepository`] trait.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_offline::{OfflineMediaStore, OfflineSongRecord, OfflineStoreConfig};
//!
//! let store = OfflineMediaStore::open(OfflineStoreConfig::in_dir(data_dir)).await?;
//!
//! store
//!     .save(OfflineSongRecord::new("s1", "Nightcall", audio_bytes).with_artist("Kavinsky"))
//!     .await?;
//!
//! match store.get("s1").await? {
//!     Some(song) => play_local(song.payload),
//!     None => stream_from_network("s1"),
//! }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod store;

pub use config::{DatabaseLocation, OfflineStoreConfig, DEFAULT_DATABASE_NAME};
pub use error::{OfflineStoreError, Result};
pub use models::{OfflineSongMeta, OfflineSongRecord, OfflineStoreStats};
pub use repository::OfflineMediaRepository;
pub use store::{OfflineMediaStore, SharedOfflineMediaStore};
