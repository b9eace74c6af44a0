use crate::error::AlertError;
use crate::history::HistoryCache;
use crate::threshold::ThresholdTable;
use chrono::{DateTime, Utc};
use hydromon_common::types::{
    ActiveAlert, IssueDetail, LogEntry, LogStatus, NewLogEntry, OpenedIssue, Reading,
    ResolvedIssue,
};
use hydromon_storage::LogSink;
use std::collections::BTreeMap;
use std::sync::Arc;

/// What one call to [`AlertEngine::evaluate`] did.
#[derive(Debug, Default)]
pub struct EvaluationOutcome {
    /// The `alert` entry written for parameters that just left their range.
    pub opened: Option<LogEntry>,
    /// The `resolved` entry written for parameters that just came back.
    pub resolved: Option<LogEntry>,
    /// Configured parameters present in the reading whose value did not
    /// parse as a number.
    pub skipped: Vec<String>,
    /// Sink writes that failed. Each one left its alert state untouched.
    pub failures: Vec<AlertError>,
}

impl EvaluationOutcome {
    /// No entry written and nothing failed.
    pub fn is_noop(&self) -> bool {
        self.opened.is_none() && self.resolved.is_none() && self.failures.is_empty()
    }
}

/// Per-parameter IN_RANGE / OUT_OF_RANGE state machine.
///
/// The engine owns the active-alert set and a bounded cache of the entries
/// it appended. It takes `&mut self` for evaluation; callers sharing one
/// engine across tasks wrap it in a mutex so evaluations are serialized and
/// queries see a consistent snapshot.
pub struct AlertEngine {
    thresholds: Arc<ThresholdTable>,
    sink: Arc<dyn LogSink>,
    active: BTreeMap<String, ActiveAlert>,
    history: HistoryCache,
}

impl AlertEngine {
    pub fn new(thresholds: Arc<ThresholdTable>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            thresholds,
            sink,
            active: BTreeMap::new(),
            history: HistoryCache::default(),
        }
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = HistoryCache::new(capacity);
        self
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    /// Evaluates `reading` at the current wall-clock time.
    pub fn evaluate(&mut self, reading: &Reading) -> EvaluationOutcome {
        self.evaluate_at(reading, Utc::now())
    }

    /// Evaluates `reading` as if it arrived at `now`.
    ///
    /// `now` stamps the log entries and `resolvedAt`; a newly opened alert
    /// records the reading's own timestamp (falling back to `now`) so
    /// durations reflect sensor time. Sink failures are collected in the
    /// outcome and never abort the call.
    pub fn evaluate_at(&mut self, reading: &Reading, now: DateTime<Utc>) -> EvaluationOutcome {
        let mut outcome = EvaluationOutcome::default();
        let mut opened = Vec::new();
        let mut resolved = Vec::new();

        for threshold in self.thresholds.iter() {
            let parameter = threshold.parameter.as_str();
            if reading.get(parameter).is_none() {
                continue;
            }
            let Some(value) = reading.numeric(parameter) else {
                tracing::debug!(parameter, "Skipping non-numeric value");
                outcome.skipped.push(parameter.to_string());
                continue;
            };

            let bounds = threshold.bounds();
            match (bounds.is_out_of_range(value), self.active.get(parameter)) {
                (true, None) => opened.push(OpenedIssue {
                    parameter: parameter.to_string(),
                    value,
                    threshold: bounds.label(),
                }),
                (false, Some(alert)) => resolved.push(ResolvedIssue {
                    parameter: parameter.to_string(),
                    value,
                    resolved: true,
                    resolved_at: now,
                    duration_minutes: elapsed_minutes(alert.opened_at, now),
                    range: bounds.label(),
                    triggered_id: alert.log_entry_id.clone(),
                }),
                _ => {}
            }
        }

        if !opened.is_empty() {
            let opened_at = reading.timestamp().unwrap_or(now);
            let parameters: Vec<String> = opened.iter().map(|i| i.parameter.clone()).collect();
            let entry = NewLogEntry {
                timestamp: now,
                status: LogStatus::Open,
                issues: opened.into_iter().map(IssueDetail::Opened).collect(),
                raw: reading.clone(),
            };

            match self.sink.append(&entry) {
                Ok(id) => {
                    // Alerts become active only once the opening is on record
                    for parameter in &parameters {
                        self.active.insert(
                            parameter.clone(),
                            ActiveAlert {
                                parameter: parameter.clone(),
                                opened_at,
                                log_entry_id: id.clone(),
                            },
                        );
                    }
                    tracing::warn!(
                        entry_id = %id,
                        parameters = %parameters.join(","),
                        "Parameters left safe range"
                    );
                    let entry = entry.with_id(id);
                    self.history.push(entry.clone());
                    outcome.opened = Some(entry);
                }
                Err(e) => {
                    tracing::error!(
                        parameters = %parameters.join(","),
                        error = %e,
                        "Failed to record opened alerts"
                    );
                    outcome.failures.push(AlertError::SinkWrite {
                        status: LogStatus::Open,
                        parameters,
                        source: e,
                    });
                }
            }
        }

        if !resolved.is_empty() {
            let parameters: Vec<String> = resolved.iter().map(|i| i.parameter.clone()).collect();
            let entry = NewLogEntry {
                timestamp: now,
                status: LogStatus::Resolved,
                issues: resolved.into_iter().map(IssueDetail::Resolved).collect(),
                raw: reading.clone(),
            };

            match self.sink.append(&entry) {
                Ok(id) => {
                    for parameter in &parameters {
                        self.active.remove(parameter);
                    }
                    tracing::info!(
                        entry_id = %id,
                        parameters = %parameters.join(","),
                        "Parameters back in safe range"
                    );
                    let entry = entry.with_id(id);
                    self.history.push(entry.clone());
                    outcome.resolved = Some(entry);
                }
                Err(e) => {
                    // Active alerts stay; the next in-range reading retries
                    tracing::error!(
                        parameters = %parameters.join(","),
                        error = %e,
                        "Failed to record resolved alerts"
                    );
                    outcome.failures.push(AlertError::SinkWrite {
                        status: LogStatus::Resolved,
                        parameters,
                        source: e,
                    });
                }
            }
        }

        outcome
    }

    /// Current active alerts keyed by parameter.
    pub fn active_alerts(&self) -> &BTreeMap<String, ActiveAlert> {
        &self.active
    }

    pub fn active_alert(&self, parameter: &str) -> Option<&ActiveAlert> {
        self.active.get(parameter)
    }

    /// Up to `limit` cached entries, most recent first.
    pub fn history(&self, limit: usize) -> Vec<LogEntry> {
        self.history.recent(limit)
    }

    /// Seeds the history cache with entries read back from the sink, newest
    /// first. Active alert state is not rebuilt from them.
    pub fn preload_history(&mut self, entries: Vec<LogEntry>) {
        self.history.extend_older(entries);
    }
}

/// Whole minutes between `from` and `to`, rounded half up, never negative.
fn elapsed_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let millis = (to - from).num_milliseconds().max(0);
    (millis as f64 / 60_000.0).round() as i64
}
