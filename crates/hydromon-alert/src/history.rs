use hydromon_common::types::LogEntry;
use std::collections::VecDeque;

/// Default number of log entries kept in process.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Bounded, newest-first cache of log entries.
///
/// Once full, pushing a new entry evicts the oldest one. Older entries stay
/// reachable through the sink's own listing.
#[derive(Debug, Clone)]
pub struct HistoryCache {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl HistoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.capacity == 0 {
            return;
        }
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Appends already-stored entries behind the cached ones. `older` must be
    /// ordered newest first.
    pub fn extend_older(&mut self, older: impl IntoIterator<Item = LogEntry>) {
        for entry in older {
            if self.entries.len() >= self.capacity {
                break;
            }
            if self.entries.iter().any(|cached| cached.id == entry.id) {
                continue;
            }
            self.entries.push_back(entry);
        }
    }

    /// Up to `limit` entries, most recent first.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        self.entries.iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HistoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
