/// Errors that can occur within the log store.
///
/// # Examples
///
/// ```rust
/// use hydromon_storage::error::StorageError;
///
/// let err = StorageError::Unavailable("disk full".to_string());
/// assert!(err.to_string().contains("disk full"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An underlying SQLite error.
    #[error("Storage: SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON encoding or decoding of the `issues` / `raw` columns failed.
    #[error("Storage: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Creating the data directory failed.
    #[error("Storage: I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A millisecond timestamp column is outside chrono's representable range.
    #[error("Storage: invalid timestamp in column '{column}': {value}")]
    InvalidTimestamp { column: &'static str, value: i64 },

    /// The `status` column holds something other than `alert` / `resolved`.
    #[error("Storage: unknown log status '{0}'")]
    UnknownStatus(String),

    /// The sink refused the write (e.g. a backend outage).
    #[error("Storage: sink unavailable: {0}")]
    Unavailable(String),
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
