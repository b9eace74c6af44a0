use crate::error::{Result, StorageError};
use crate::LogSink;
use chrono::{DateTime, Utc};
use hydromon_common::types::{IssueDetail, LogEntry, LogStatus, NewLogEntry, Reading};
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// File name of the log database inside the data directory.
pub const DB_FILE: &str = "parameter_logs.db";

const PARAMETER_LOGS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS parameter_logs (
    id TEXT PRIMARY KEY,
    timestamp INTEGER NOT NULL,
    status TEXT NOT NULL,
    issues TEXT NOT NULL,
    raw TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_parameter_logs_time ON parameter_logs(timestamp);
CREATE INDEX IF NOT EXISTS idx_parameter_logs_status ON parameter_logs(status);
";

const SELECT_COLUMNS: &str = "SELECT id, timestamp, status, issues, raw FROM parameter_logs";

/// SQLite-backed [`LogSink`].
///
/// One database file, WAL mode, ids from the snowflake generator in
/// [`hydromon_common::id`]. Rows are insert-only.
pub struct SqliteLogStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteLogStore {
    /// Opens (creating if needed) `parameter_logs.db` under `data_dir`.
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(DB_FILE);
        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(PARAMETER_LOGS_SCHEMA)?;
        tracing::info!(path = %path.display(), "Opened parameter log store");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path),
        })
    }

    /// A throwaway store that lives only as long as this value.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(PARAMETER_LOGS_SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Lock the connection, recovering from a poisoned Mutex if necessary.
    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, id: &str) -> Result<Option<LogEntry>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare_cached(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
        let row = stmt.query_row([id], RawRow::from_row).optional()?;
        row.map(RawRow::into_entry).transpose()
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.lock_conn();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM parameter_logs", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

impl LogSink for SqliteLogStore {
    fn append(&self, entry: &NewLogEntry) -> Result<String> {
        let id = hydromon_common::id::next_id();
        let issues = serde_json::to_string(&entry.issues)?;
        let raw = serde_json::to_string(&entry.raw)?;

        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO parameter_logs (id, timestamp, status, issues, raw, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                &id,
                entry.timestamp.timestamp_millis(),
                entry.status.as_str(),
                issues,
                raw,
                Utc::now().timestamp_millis(),
            ],
        )?;

        tracing::debug!(entry_id = %id, status = %entry.status, "Appended parameter log entry");
        Ok(id)
    }

    fn list(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let conn = self.lock_conn();
        // rowid breaks ties between the alert and resolved entries of one evaluation
        let mut stmt = conn.prepare_cached(&format!(
            "{SELECT_COLUMNS} ORDER BY timestamp DESC, rowid DESC LIMIT ?1"
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map([limit], RawRow::from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.into_entry()?);
        }
        Ok(entries)
    }
}

/// Column values as stored, before JSON and timestamp decoding.
struct RawRow {
    id: String,
    timestamp_ms: i64,
    status: String,
    issues: String,
    raw: String,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            timestamp_ms: row.get(1)?,
            status: row.get(2)?,
            issues: row.get(3)?,
            raw: row.get(4)?,
        })
    }

    fn into_entry(self) -> Result<LogEntry> {
        let timestamp: DateTime<Utc> = DateTime::from_timestamp_millis(self.timestamp_ms).ok_or(
            StorageError::InvalidTimestamp {
                column: "timestamp",
                value: self.timestamp_ms,
            },
        )?;
        let status: LogStatus = self
            .status
            .parse()
            .map_err(|_| StorageError::UnknownStatus(self.status.clone()))?;
        let issues: Vec<IssueDetail> = serde_json::from_str(&self.issues)?;
        let raw: Reading = serde_json::from_str(&self.raw)?;

        Ok(LogEntry {
            id: self.id,
            timestamp,
            status,
            issues,
            raw,
        })
    }
}
