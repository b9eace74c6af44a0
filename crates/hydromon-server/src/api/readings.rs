use crate::api::{error_response, success_empty_response, success_response, LogEntryResponse};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hydromon_alert::EvaluationOutcome;
use hydromon_common::types::Reading;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Sensor reading: parameter name to value, plus an optional `timestamp`
/// (RFC 3339, offset-less `YYYY-MM-DD HH:MM:SS` as UTC, or epoch
/// milliseconds). Numeric strings are accepted.
#[derive(Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct ReadingPayload(Map<String, Value>);

/// Result of a synchronous evaluation
#[derive(Serialize, ToSchema)]
pub struct EvaluateResponse {
    /// Entry written for parameters that left their range
    pub opened: Option<LogEntryResponse>,
    /// Entry written for parameters that came back
    pub resolved: Option<LogEntryResponse>,
    /// Parameters present but not numeric
    pub skipped: Vec<String>,
    /// Log writes that failed; the affected alerts kept their state
    pub failures: Vec<String>,
}

impl From<EvaluationOutcome> for EvaluateResponse {
    fn from(outcome: EvaluationOutcome) -> Self {
        Self {
            opened: outcome.opened.map(LogEntryResponse::from),
            resolved: outcome.resolved.map(LogEntryResponse::from),
            skipped: outcome.skipped,
            failures: outcome.failures.iter().map(|e| e.to_string()).collect(),
        }
    }
}

fn parse_reading(
    trace_id: &str,
    payload: Result<Json<ReadingPayload>, JsonRejection>,
) -> Result<Reading, Response> {
    match payload {
        Ok(Json(ReadingPayload(fields))) => Ok(Reading::from(fields)),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected reading body");
            Err(error_response(
                StatusCode::BAD_REQUEST,
                trace_id,
                "bad_request",
                "Reading must be a JSON object",
            ))
        }
    }
}

/// Queue a reading for evaluation.
///
/// Submissions are coalesced: a reading still waiting when a newer one
/// arrives is replaced by it.
#[utoipa::path(
    post,
    path = "/v1/readings",
    tag = "Readings",
    request_body = ReadingPayload,
    responses(
        (status = 202, description = "Reading accepted"),
        (status = 400, description = "Body is not a JSON object", body = crate::api::ApiError)
    )
)]
async fn submit_reading(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    payload: Result<Json<ReadingPayload>, JsonRejection>,
) -> impl IntoResponse {
    let reading = match parse_reading(&trace_id, payload) {
        Ok(reading) => reading,
        Err(resp) => return resp,
    };
    state.ingest.submit(reading);
    success_empty_response(StatusCode::ACCEPTED, &trace_id, "accepted")
}

/// Evaluate a reading immediately and return what changed.
#[utoipa::path(
    post,
    path = "/v1/readings/evaluate",
    tag = "Readings",
    request_body = ReadingPayload,
    responses(
        (status = 200, description = "Evaluation result", body = EvaluateResponse),
        (status = 400, description = "Body is not a JSON object", body = crate::api::ApiError),
        (status = 500, description = "Evaluation task failed", body = crate::api::ApiError)
    )
)]
async fn evaluate_reading(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    payload: Result<Json<ReadingPayload>, JsonRejection>,
) -> impl IntoResponse {
    let reading = match parse_reading(&trace_id, payload) {
        Ok(reading) => reading,
        Err(resp) => return resp,
    };

    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut engine = engine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        engine.evaluate(&reading)
    })
    .await;

    match result {
        Ok(outcome) => success_response(
            StatusCode::OK,
            &trace_id,
            EvaluateResponse::from(outcome),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Evaluation task failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "internal_error",
                "Evaluation failed",
            )
        }
    }
}

pub fn reading_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(submit_reading))
        .routes(routes!(evaluate_reading))
}
