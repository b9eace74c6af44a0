use hydromon_alert::AlertEngine;
use hydromon_common::types::Reading;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Push side of the reading stream.
///
/// Only the newest submitted reading is kept: if several arrive while an
/// evaluation is running, the worker evaluates the last one and the others
/// are dropped.
pub struct ReadingIngest {
    tx: watch::Sender<Option<Reading>>,
}

impl ReadingIngest {
    pub fn new() -> (Self, watch::Receiver<Option<Reading>>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, rx)
    }

    pub fn submit(&self, reading: Reading) {
        self.tx.send_replace(Some(reading));
    }
}

/// Spawns the task that evaluates submitted readings one at a time.
///
/// The task ends when the [`ReadingIngest`] is dropped.
pub fn spawn_worker(
    engine: Arc<Mutex<AlertEngine>>,
    mut rx: watch::Receiver<Option<Reading>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let Some(reading) = rx.borrow_and_update().clone() else {
                continue;
            };

            let engine = engine.clone();
            // SQLite writes happen under the engine lock
            let result = tokio::task::spawn_blocking(move || {
                let mut engine = engine
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                engine.evaluate(&reading)
            })
            .await;

            match result {
                Ok(outcome) if !outcome.failures.is_empty() => {
                    tracing::warn!(
                        failures = outcome.failures.len(),
                        "Reading evaluated with log write failures"
                    );
                }
                Ok(outcome) => {
                    tracing::debug!(
                        opened = outcome.opened.is_some(),
                        resolved = outcome.resolved.is_some(),
                        skipped = outcome.skipped.len(),
                        "Reading evaluated"
                    );
                }
                Err(e) => tracing::error!(error = %e, "Evaluation task failed"),
            }
        }
        tracing::info!("Reading stream closed, ingest worker stopping");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydromon_alert::ThresholdTable;
    use hydromon_storage::memory::MemoryLogSink;
    use serde_json::json;
    use std::time::Duration;

    fn reading(temperature: f64) -> Reading {
        [("temperature", json!(temperature))].into_iter().collect()
    }

    #[tokio::test]
    async fn worker_evaluates_latest_submission() {
        let sink = Arc::new(MemoryLogSink::new());
        let engine = Arc::new(Mutex::new(AlertEngine::new(
            Arc::new(ThresholdTable::default()),
            sink.clone(),
        )));
        let (ingest, rx) = ReadingIngest::new();
        let worker = spawn_worker(engine.clone(), rx);

        ingest.submit(reading(20.0));
        ingest.submit(reading(25.0));
        ingest.submit(reading(50.0));

        let mut active = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            active = engine.lock().unwrap().active_alert("temperature").is_some();
            if active {
                break;
            }
        }
        assert!(active, "latest reading should have opened an alert");
        assert_eq!(sink.len(), 1);

        drop(ingest);
        tokio::time::timeout(Duration::from_secs(1), worker)
            .await
            .expect("worker should stop when the ingest side is dropped")
            .unwrap();
    }
}
