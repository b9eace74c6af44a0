use crate::api::pagination::LimitParams;
use crate::api::{success_response, LogEntryResponse};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use hydromon_common::types::ActiveAlert;
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// A parameter currently out of its safe range
#[derive(Serialize, ToSchema)]
pub struct ActiveAlertResponse {
    /// Parameter name
    pub parameter: String,
    /// Sensor time of the reading that opened the alert
    pub opened_at: DateTime<Utc>,
    /// `opened_at` for display, e.g. `2024-05-01 08:00:00 UTC`
    pub since: String,
    /// Id of the alert log entry
    pub log_entry_id: String,
}

impl From<&ActiveAlert> for ActiveAlertResponse {
    fn from(alert: &ActiveAlert) -> Self {
        Self {
            parameter: alert.parameter.clone(),
            opened_at: alert.opened_at,
            since: alert.opened_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            log_entry_id: alert.log_entry_id.clone(),
        }
    }
}

/// Configured safe range
#[derive(Serialize, ToSchema)]
pub struct ThresholdResponse {
    pub parameter: String,
    pub min: f64,
    pub max: f64,
    /// `min–max`
    pub range: String,
}

/// Parameters currently out of range, by parameter name.
#[utoipa::path(
    get,
    path = "/v1/alerts/active",
    tag = "Alerts",
    responses(
        (status = 200, description = "Active alerts", body = Vec<ActiveAlertResponse>)
    )
)]
async fn list_active_alerts(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let items: Vec<ActiveAlertResponse> = state
        .lock_engine()
        .active_alerts()
        .values()
        .map(ActiveAlertResponse::from)
        .collect();
    success_response(StatusCode::OK, &trace_id, items)
}

/// Entries recorded by this process, newest first.
#[utoipa::path(
    get,
    path = "/v1/alerts/history",
    tag = "Alerts",
    params(LimitParams),
    responses(
        (status = 200, description = "Recent alert log entries", body = Vec<LogEntryResponse>)
    )
)]
async fn alert_history(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> impl IntoResponse {
    let entries = state.lock_engine().history(params.resolve());
    let items: Vec<LogEntryResponse> = entries.into_iter().map(LogEntryResponse::from).collect();
    success_response(StatusCode::OK, &trace_id, items)
}

/// Safe ranges in evaluation order.
#[utoipa::path(
    get,
    path = "/v1/thresholds",
    tag = "Alerts",
    responses(
        (status = 200, description = "Threshold table", body = Vec<ThresholdResponse>)
    )
)]
async fn list_thresholds(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let items: Vec<ThresholdResponse> = state
        .thresholds
        .iter()
        .map(|t| ThresholdResponse {
            parameter: t.parameter.clone(),
            min: t.min,
            max: t.max,
            range: t.bounds().label(),
        })
        .collect();
    success_response(StatusCode::OK, &trace_id, items)
}

pub fn alert_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_active_alerts))
        .routes(routes!(alert_history))
        .routes(routes!(list_thresholds))
}
