use crate::config::ServerConfig;
use crate::ingest::ReadingIngest;
use chrono::{DateTime, Utc};
use hydromon_alert::{AlertEngine, ThresholdTable};
use hydromon_storage::sqlite::SqliteLogStore;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct AppState {
    /// Single writer: every evaluation and every query takes this lock.
    pub engine: Arc<Mutex<AlertEngine>>,
    pub store: Arc<SqliteLogStore>,
    pub thresholds: Arc<ThresholdTable>,
    pub ingest: Arc<ReadingIngest>,
    pub start_time: DateTime<Utc>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Lock the engine, recovering from a poisoned Mutex if necessary.
    pub fn lock_engine(&self) -> MutexGuard<'_, AlertEngine> {
        self.engine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
