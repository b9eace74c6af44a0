use crate::api::pagination::LimitParams;
use crate::api::{error_response, success_response, LogEntryResponse};
use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use hydromon_storage::LogSink;
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Page of durable log entries
#[derive(Serialize, ToSchema)]
struct LogListResponse {
    /// Entries in the store
    total: u64,
    /// Newest first
    items: Vec<LogEntryResponse>,
}

/// Durable alert log, newest first.
#[utoipa::path(
    get,
    path = "/v1/logs",
    tag = "Logs",
    params(LimitParams),
    responses(
        (status = 200, description = "Stored log entries", body = LogListResponse),
        (status = 500, description = "Storage failure", body = crate::api::ApiError)
    )
)]
async fn list_logs(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> impl IntoResponse {
    let entries = match state.store.list(params.resolve()) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list log entries");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "storage_error",
                "Failed to read alert log",
            );
        }
    };
    let total = match state.store.count() {
        Ok(total) => total,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count log entries");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "storage_error",
                "Failed to read alert log",
            );
        }
    };
    success_response(
        StatusCode::OK,
        &trace_id,
        LogListResponse {
            total,
            items: entries.into_iter().map(LogEntryResponse::from).collect(),
        },
    )
}

/// A single stored entry by id.
#[utoipa::path(
    get,
    path = "/v1/logs/{id}",
    tag = "Logs",
    params(("id" = String, Path, description = "Log entry id")),
    responses(
        (status = 200, description = "Log entry", body = LogEntryResponse),
        (status = 404, description = "No entry with this id", body = crate::api::ApiError)
    )
)]
async fn get_log(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get(&id) {
        Ok(Some(entry)) => {
            success_response(StatusCode::OK, &trace_id, LogEntryResponse::from(entry))
        }
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            "Log entry not found",
        ),
        Err(e) => {
            tracing::error!(id = %id, error = %e, "Failed to read log entry");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "storage_error",
                "Failed to read alert log",
            )
        }
    }
}

pub fn log_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_logs))
        .routes(routes!(get_log))
}
