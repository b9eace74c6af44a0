use hydromon_common::types::LogStatus;
use hydromon_storage::StorageError;

/// Errors raised by threshold configuration and alert evaluation.
///
/// ```rust
/// use hydromon_alert::AlertError;
///
/// let err = AlertError::DuplicateThreshold("ph".to_string());
/// assert!(err.to_string().contains("ph"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// A configured bound is not finite or `min > max`.
    #[error("Alert: invalid threshold for '{parameter}': {reason}")]
    InvalidThreshold { parameter: String, reason: String },

    /// The same parameter was configured twice.
    #[error("Alert: duplicate threshold for '{0}'")]
    DuplicateThreshold(String),

    /// The log sink rejected a batch. Alert state gated on that write was
    /// left untouched.
    #[error("Alert: failed to write {status} entry for [{}]: {source}", .parameters.join(", "))]
    SinkWrite {
        status: LogStatus,
        parameters: Vec<String>,
        #[source]
        source: StorageError,
    },
}
