use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field carrying the sensor's own sample time inside a [`Reading`].
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Offset-less layouts some gateways send; read as UTC.
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// One sampled instant from the sensor gateway.
///
/// A reading is a flat JSON object. Parameter values may arrive as JSON
/// numbers or as numeric strings; anything else is treated as malformed for
/// that parameter only.
///
/// # Examples
///
/// ```
/// use hydromon_common::types::Reading;
/// use serde_json::json;
///
/// let reading = Reading::from_value(json!({
///     "ph": "6.1",
///     "temperature": 24.5,
///     "tds": "n/a",
///     "timestamp": "2024-05-01T08:00:00Z",
/// }))
/// .unwrap();
///
/// assert_eq!(reading.numeric("ph"), Some(6.1));
/// assert_eq!(reading.numeric("temperature"), Some(24.5));
/// assert_eq!(reading.numeric("tds"), None);
/// assert_eq!(reading.numeric("humidity"), None);
/// assert!(reading.timestamp().is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reading(Map<String, Value>);

impl Reading {
    /// Builds a reading from a JSON value. Returns `None` unless the value is
    /// an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Parses `parameter` as a finite float.
    ///
    /// Numeric strings are trimmed before parsing. Missing fields, booleans,
    /// nulls, non-numeric strings, `NaN` and infinities all yield `None`.
    pub fn numeric(&self, parameter: &str) -> Option<f64> {
        let value = match self.0.get(parameter)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        value.is_finite().then_some(value)
    }

    pub fn ph(&self) -> Option<f64> {
        self.numeric("ph")
    }

    pub fn temperature(&self) -> Option<f64> {
        self.numeric("temperature")
    }

    pub fn tds(&self) -> Option<f64> {
        self.numeric("tds")
    }

    pub fn humidity(&self) -> Option<f64> {
        self.numeric("humidity")
    }

    /// The sensor-side sample time, if the reading carries one.
    ///
    /// Accepts RFC 3339, `YYYY-MM-DD[T ]HH:MM:SS[.fff]` without an offset
    /// (taken as UTC), or integer epoch milliseconds.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self.0.get(TIMESTAMP_FIELD)? {
            Value::String(s) => parse_timestamp_str(s),
            Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for Reading {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Reading {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Kind of transition a [`LogEntry`] records.
///
/// Serialized as `"alert"` / `"resolved"`, the values the parameter log
/// viewers key their badges on. `"open"` is accepted on input.
///
/// ```
/// use hydromon_common::types::LogStatus;
///
/// let status: LogStatus = "resolved".parse().unwrap();
/// assert_eq!(status, LogStatus::Resolved);
/// assert_eq!(LogStatus::Open.to_string(), "alert");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogStatus {
    #[serde(rename = "alert", alias = "open")]
    Open,
    #[serde(rename = "resolved")]
    Resolved,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Open => "alert",
            LogStatus::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alert" | "open" => Ok(LogStatus::Open),
            "resolved" => Ok(LogStatus::Resolved),
            _ => Err(format!("unknown log status: {s}")),
        }
    }
}

/// A parameter that just left its safe range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenedIssue {
    pub parameter: String,
    pub value: f64,
    /// Configured safe range, rendered `"min–max"`.
    pub threshold: String,
}

/// A parameter that just returned to its safe range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIssue {
    pub parameter: String,
    pub value: f64,
    pub resolved: bool,
    pub resolved_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub range: String,
    /// Id of the `alert` entry this resolution closes.
    pub triggered_id: String,
}

/// One line of a log entry's issue list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssueDetail {
    // Listed first: untagged matching tries variants in order and an opened
    // issue's fields are a subset of a resolved one's.
    Resolved(ResolvedIssue),
    Opened(OpenedIssue),
}

impl IssueDetail {
    pub fn parameter(&self) -> &str {
        match self {
            IssueDetail::Resolved(issue) => &issue.parameter,
            IssueDetail::Opened(issue) => &issue.parameter,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            IssueDetail::Resolved(issue) => issue.value,
            IssueDetail::Opened(issue) => issue.value,
        }
    }

    /// The safe range shown next to the value.
    pub fn range(&self) -> &str {
        match self {
            IssueDetail::Resolved(issue) => &issue.range,
            IssueDetail::Opened(issue) => &issue.threshold,
        }
    }
}

/// A log entry before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLogEntry {
    pub timestamp: DateTime<Utc>,
    pub status: LogStatus,
    pub issues: Vec<IssueDetail>,
    pub raw: Reading,
}

impl NewLogEntry {
    pub fn with_id(self, id: impl Into<String>) -> LogEntry {
        LogEntry {
            id: id.into(),
            timestamp: self.timestamp,
            status: self.status,
            issues: self.issues,
            raw: self.raw,
        }
    }
}

/// Durable record of a batch of simultaneous transitions: all opens of one
/// evaluation, or all resolves of one evaluation. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub status: LogStatus,
    pub issues: Vec<IssueDetail>,
    pub raw: Reading,
}

impl LogEntry {
    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().map(IssueDetail::parameter)
    }
}

/// A parameter currently out of range with no resolution recorded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAlert {
    pub parameter: String,
    /// Sensor time of the reading that opened the alert.
    pub opened_at: DateTime<Utc>,
    /// Id of the `alert` log entry that opened it.
    pub log_entry_id: String,
}
