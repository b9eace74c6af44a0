//! Append-only persistence for the parameter alert log.
//!
//! The alert engine writes every batch of transitions through a
//! [`LogSink`]. [`sqlite::SqliteLogStore`] is the durable implementation
//! used by the server; [`memory::MemoryLogSink`] keeps entries in process
//! and can be switched into a failing mode to exercise write-failure paths.

pub mod error;
pub mod memory;
pub mod sqlite;


use hydromon_common::types::{LogEntry, NewLogEntry};

pub use error::{Result, StorageError};

/// Append-only store for alert log entries.
///
/// Implementations must be safe to share across threads (`Send + Sync`)
/// because the engine writes from the ingest worker while HTTP handlers list
/// entries concurrently.
pub trait LogSink: Send + Sync {
    /// Durably appends `entry` and returns the id the store assigned to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry could not be recorded. Nothing is
    /// written in that case.
    fn append(&self, entry: &NewLogEntry) -> Result<String>;

    /// Returns up to `limit` entries, most recent first.
    fn list(&self, limit: usize) -> Result<Vec<LogEntry>>;
}
