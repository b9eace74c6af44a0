use crate::error::{Result, StorageError};
use crate::LogSink;
use hydromon_common::types::{LogEntry, LogStatus, NewLogEntry};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Which appends a [`MemoryLogSink`] should reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailMode {
    #[default]
    Never,
    Always,
    /// Reject only entries with this status.
    Status(LogStatus),
}

impl FailMode {
    fn rejects(&self, status: LogStatus) -> bool {
        match self {
            FailMode::Never => false,
            FailMode::Always => true,
            FailMode::Status(s) => *s == status,
        }
    }
}

/// In-process [`LogSink`] with sequential ids (`log-1`, `log-2`, ...).
///
/// ```
/// use hydromon_storage::memory::{FailMode, MemoryLogSink};
/// use hydromon_storage::LogSink;
///
/// let sink = MemoryLogSink::new();
/// sink.set_fail_mode(FailMode::Always);
/// assert!(sink.list(10).unwrap().is_empty());
/// ```
#[derive(Default)]
pub struct MemoryLogSink {
    entries: Mutex<Vec<LogEntry>>,
    seq: AtomicU64,
    fail_mode: Mutex<FailMode>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_mode(&self, mode: FailMode) {
        *self
            .fail_mode
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = mode;
    }

    fn lock_entries(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every stored entry, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock_entries().clone()
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }
}

impl LogSink for MemoryLogSink {
    fn append(&self, entry: &NewLogEntry) -> Result<String> {
        let mode = *self
            .fail_mode
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if mode.rejects(entry.status) {
            return Err(StorageError::Unavailable(format!(
                "memory sink rejecting {} entries",
                entry.status
            )));
        }

        let id = format!("log-{}", self.seq.fetch_add(1, Ordering::SeqCst) + 1);
        self.lock_entries().push(entry.clone().with_id(id.clone()));
        Ok(id)
    }

    fn list(&self, limit: usize) -> Result<Vec<LogEntry>> {
        Ok(self.lock_entries().iter().rev().take(limit).cloned().collect())
    }
}
