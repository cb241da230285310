use thiserror::Error;

/// SQLite primary result code for `SQLITE_FULL` (disk full or `max_page_count` reached).
const SQLITE_FULL: i32 = 13;

#[derive(Error, Debug)]
pub enum OfflineStoreError {
    #[error("Storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl OfflineStoreError {
    pub(crate) fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Returns `true` when the backing medium failed (I/O, quota, corruption,
    /// closed pool, schema upgrade).
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Migration(_))
    }

    /// Returns `true` when a write was rejected because the database file hit
    /// its size limit or the device ran out of space.
    pub fn is_quota_exceeded(&self) -> bool {
        let Self::Storage(sqlx::Error::Database(db_err)) = self else {
            return false;
        };

        // Extended result codes carry the primary code in the low byte.
        db_err
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| code & 0xff == SQLITE_FULL)
            .unwrap_or(false)
    }
}

pub type Result<T> = std::result::Result<T, OfflineStoreError>;
