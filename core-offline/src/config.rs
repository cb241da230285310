//! Offline store configuration

use crate::error::{OfflineStoreError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the offline media database inside the application data directory.
pub const DEFAULT_DATABASE_NAME: &str = "offline-media.db";

/// SQLite page size used by the store; quota limits are expressed in pages of this size.
pub const PAGE_SIZE_BYTES: u32 = 4096;

/// Where the offline database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// Database file on disk; the path is used verbatim, never parsed as a URL
    File(PathBuf),
    /// Private in-memory database, dropped when its connection closes
    Memory,
}

impl fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseLocation::File(path) => write!(f, "{}", path.display()),
            DatabaseLocation::Memory => f.write_str(":memory:"),
        }
    }
}

/// Configuration for [`OfflineMediaStore`](crate::OfflineMediaStore).
#[derive(Debug, Clone)]
pub struct OfflineStoreConfig {
    /// Database file or in-memory database
    pub location: DatabaseLocation,

    /// Minimum number of pooled connections
    pub min_connections: u32,

    /// Maximum number of pooled connections
    pub max_connections: u32,

    /// Maximum time to wait for a pooled connection
    pub acquire_timeout: Duration,

    /// How long a writer waits on SQLite's lock before failing
    pub busy_timeout: Duration,

    /// Number of prepared statements cached per connection
    pub statement_cache_capacity: usize,

    /// Upper bound on the database file size; writes past it fail with a quota error
    pub max_database_size_bytes: Option<u64>,
}

impl OfflineStoreConfig {
    /// Configuration for a database file at `database_path`.
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            location: DatabaseLocation::File(database_path.into()),
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            statement_cache_capacity: 100,
            max_database_size_bytes: None,
        }
    }

    /// Configuration for [`DEFAULT_DATABASE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_DATABASE_NAME))
    }

    /// In-memory database, mostly useful for tests.
    ///
    /// Limited to a single connection: shared-cache memory databases report
    /// lock conflicts immediately instead of waiting on the busy timeout.
    pub fn in_memory() -> Self {
        Self {
            location: DatabaseLocation::Memory,
            min_connections: 1,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            statement_cache_capacity: 100,
            max_database_size_bytes: None,
        }
    }

    /// Set the minimum number of connections
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Set the maximum number of connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set how long to wait for a free connection
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Set how long a writer waits on a locked database
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Set the number of prepared statements cached per connection
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache_capacity = capacity;
        self
    }

    /// Limit the database file to roughly `bytes` bytes.
    pub fn max_database_size_bytes(mut self, bytes: u64) -> Self {
        self.max_database_size_bytes = Some(bytes);
        self
    }

    /// Whether the store lives in memory rather than in a file
    pub fn is_in_memory(&self) -> bool {
        matches!(self.location, DatabaseLocation::Memory)
    }

    /// Quota expressed as a SQLite `max_page_count` value.
    pub(crate) fn max_page_count(&self) -> Option<u64> {
        self.max_database_size_bytes
            .map(|bytes| (bytes / PAGE_SIZE_BYTES as u64).max(1))
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if let DatabaseLocation::File(path) = &self.location {
            if path.as_os_str().is_empty() {
                return Err(OfflineStoreError::Config(
                    "database path cannot be empty".to_string(),
                ));
            }
        }

        if self.max_connections == 0 {
            return Err(OfflineStoreError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(OfflineStoreError::Config(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }

        if self.is_in_memory() && self.max_connections > 1 {
            return Err(OfflineStoreError::Config(
                "in-memory databases support a single connection".to_string(),
            ));
        }

        if let Some(bytes) = self.max_database_size_bytes {
            if bytes < PAGE_SIZE_BYTES as u64 {
                return Err(OfflineStoreError::Config(format!(
                    "max_database_size_bytes must be at least one page ({} bytes)",
                    PAGE_SIZE_BYTES
                )));
            }
        }

        Ok(())
    }
}

impl Default for OfflineStoreConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_dir_uses_default_name() {
        let config = OfflineStoreConfig::in_dir("/data/app");
        assert_eq!(
            config.location,
            DatabaseLocation::File(PathBuf::from("/data/app").join(DEFAULT_DATABASE_NAME))
        );
        assert!(!config.is_in_memory());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = OfflineStoreConfig::new("/tmp/offline.db")
            .min_connections(2)
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(10))
            .busy_timeout(Duration::from_millis(250))
            .statement_cache_capacity(32)
            .max_database_size_bytes(1024 * 1024);

        assert_eq!(config.min_connections, 2);
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.acquire_timeout, Duration::from_secs(10));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.statement_cache_capacity, 32);
        assert_eq!(config.max_page_count(), Some(256));
    }

    #[test]
    fn test_validation() {
        assert!(OfflineStoreConfig::default().validate().is_ok());

        let zero_max = OfflineStoreConfig::new("a.db").max_connections(0);
        assert!(zero_max.validate().is_err());

        let inverted = OfflineStoreConfig::new("a.db")
            .min_connections(4)
            .max_connections(2);
        assert!(inverted.validate().is_err());

        let pooled_memory = OfflineStoreConfig::in_memory().max_connections(4);
        assert!(pooled_memory.validate().is_err());

        let tiny_quota = OfflineStoreConfig::new("a.db").max_database_size_bytes(100);
        assert!(tiny_quota.validate().is_err());

        let no_path = OfflineStoreConfig::new("");
        assert!(matches!(no_path.validate(), Err(OfflineStoreError::Config(_))));
    }

    #[test]
    fn test_paths_are_not_parsed_as_urls() {
        let config = OfflineStoreConfig::in_dir("/data/what?/a%20b");
        assert!(config.validate().is_ok());
        assert_eq!(
            config.location.to_string(),
            format!("/data/what?/a%20b/{}", DEFAULT_DATABASE_NAME)
        );
        assert_eq!(DatabaseLocation::Memory.to_string(), ":memory:");
    }
}
