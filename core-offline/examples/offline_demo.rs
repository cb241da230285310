//! # Offline Store Demo
//!
//! Saves a song, plays it back from the store, lists downloads and removes it.
//!
//! Run with: `cargo run --example offline_demo --package core-offline [data-dir]`

use core_offline::{OfflineMediaStore, OfflineSongRecord, OfflineStoreConfig, Result};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::env;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);
    if let Err(e) = init_logging(config) {
        eprintln!("Logging disabled: {}", e);
    }

    let store_config = match env::args().nth(1) {
        Some(dir) => OfflineStoreConfig::in_dir(dir),
        None => OfflineStoreConfig::in_memory(),
    };
    let store = OfflineMediaStore::open(store_config).await?;

    // Stand-in for audio bytes handed over by the download collaborator.
    let audio: Vec<u8> = (0..17u8).collect();
    let song = OfflineSongRecord::new("s1", "Nightcall", audio)
        .with_artist("Kavinsky")
        .with_duration_ms(255_000)
        .with_mime_type("audio/mpeg");
    store.save(song).await?;

    match store.get("s1").await? {
        Some(found) => info!(
            title = %found.title,
            bytes = found.payload.len(),
            "Playing from offline store"
        ),
        None => info!("Not available offline, streaming from network"),
    }

    for meta in store.list().await? {
        info!(id = %meta.id, title = %meta.title, downloaded_at = meta.downloaded_at, "Offline song");
    }

    let stats = store.stats().await?;
    info!(songs = stats.song_count, bytes = stats.total_payload_bytes, "Store usage");

    store.delete("s1").await?;
    info!(remaining = store.list().await?.len(), "Deleted s1");

    store.close().await;
    Ok(())
}
