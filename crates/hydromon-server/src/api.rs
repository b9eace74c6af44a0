pub mod alerts;
pub mod logs;
pub mod pagination;
pub mod readings;

use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use hydromon_common::types::{IssueDetail, LogEntry};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Error envelope
#[derive(Serialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub err_code: i32,
    /// Error message
    pub err_msg: String,
    /// Request trace id
    pub trace_id: String,
}

/// Response envelope shared by every endpoint
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    /// 0 on success
    pub err_code: i32,
    /// `success` or a short description
    pub err_msg: String,
    pub trace_id: String,
    pub data: Option<T>,
}

pub fn success_response<T>(status: StatusCode, trace_id: &str, data: T) -> Response
where
    T: Serialize,
{
    (
        status,
        Json(ApiResponse {
            err_code: 0,
            err_msg: "success".to_string(),
            trace_id: trace_id.to_string(),
            data: Some(data),
        }),
    )
        .into_response()
}

pub fn success_empty_response(status: StatusCode, trace_id: &str, msg: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            err_code: 0,
            err_msg: msg.to_string(),
            trace_id: trace_id.to_string(),
            data: None,
        }),
    )
        .into_response()
}

fn to_custom_error_code(code: &str) -> i32 {
    match code {
        "bad_request" => 1001,
        "not_found" => 1004,
        "payload_too_large" => 1413,
        "internal_error" => 1500,
        "storage_error" => 1501,
        _ => 1999,
    }
}

pub fn error_response(status: StatusCode, trace_id: &str, code: &str, msg: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            err_code: to_custom_error_code(code),
            err_msg: msg.to_string(),
            trace_id: trace_id.to_string(),
            data: None,
        }),
    )
        .into_response()
}

/// One issue line of a log entry
#[derive(Serialize, ToSchema)]
pub struct IssueResponse {
    /// Parameter name (ph / temperature / tds / humidity)
    pub parameter: String,
    /// Value that caused the transition
    pub value: f64,
    /// Safe range, `min–max`
    pub threshold: String,
    /// Resolution time (resolved entries only)
    pub resolved_at: Option<DateTime<Utc>>,
    /// Minutes the parameter spent out of range (resolved entries only)
    pub duration_minutes: Option<i64>,
    /// Id of the alert entry this resolution closes (resolved entries only)
    pub triggered_id: Option<String>,
}

impl From<&IssueDetail> for IssueResponse {
    fn from(issue: &IssueDetail) -> Self {
        let (resolved_at, duration_minutes, triggered_id) = match issue {
            IssueDetail::Resolved(r) => (
                Some(r.resolved_at),
                Some(r.duration_minutes),
                Some(r.triggered_id.clone()),
            ),
            IssueDetail::Opened(_) => (None, None, None),
        };
        Self {
            parameter: issue.parameter().to_string(),
            value: issue.value(),
            threshold: issue.range().to_string(),
            resolved_at,
            duration_minutes,
            triggered_id,
        }
    }
}

/// Alert log entry
#[derive(Serialize, ToSchema)]
pub struct LogEntryResponse {
    /// Entry id assigned by the log store
    pub id: String,
    /// Evaluation time
    pub timestamp: DateTime<Utc>,
    /// `alert` or `resolved`
    pub status: String,
    /// Parameters that transitioned, in threshold order
    pub issues: Vec<IssueResponse>,
    /// Reading values, null when absent or not numeric
    pub ph: Option<f64>,
    pub temperature: Option<f64>,
    pub tds: Option<f64>,
    pub humidity: Option<f64>,
    /// The reading as received
    #[schema(value_type = Object)]
    pub raw: Value,
}

impl From<LogEntry> for LogEntryResponse {
    fn from(entry: LogEntry) -> Self {
        Self {
            issues: entry.issues.iter().map(IssueResponse::from).collect(),
            ph: entry.raw.ph(),
            temperature: entry.raw.temperature(),
            tds: entry.raw.tds(),
            humidity: entry.raw.humidity(),
            status: entry.status.to_string(),
            raw: Value::Object(entry.raw.fields().clone()),
            timestamp: entry.timestamp,
            id: entry.id,
        }
    }
}

/// Service health
#[derive(Serialize, ToSchema)]
struct HealthResponse {
    /// Server version
    version: String,
    /// Seconds since start
    uptime_secs: i64,
    /// Parameters currently out of range
    active_alerts: usize,
    /// Entries kept for `/v1/alerts/history`
    history_capacity: usize,
    /// Entries in the durable log
    stored_entries: Option<u64>,
    /// `ok` or `error`
    storage_status: String,
}

/// Service health and alert counters.
#[utoipa::path(
    get,
    path = "/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    )
)]
async fn health(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let uptime = (Utc::now() - state.start_time).num_seconds();
    let active_alerts = state.lock_engine().active_alerts().len();
    let (stored_entries, storage_status) = match state.store.count() {
        Ok(count) => (Some(count), "ok"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to count log entries");
            (None, "error")
        }
    };
    success_response(
        StatusCode::OK,
        &trace_id,
        HealthResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: uptime,
            active_alerts,
            history_capacity: state.config.history_capacity,
            stored_entries,
            storage_status: storage_status.to_string(),
        },
    )
}

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health))
        .merge(alerts::alert_routes())
        .merge(logs::log_routes())
        .merge(readings::reading_routes())
}
