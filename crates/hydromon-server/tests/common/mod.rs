#![allow(dead_code)]

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use hydromon_alert::{AlertEngine, ThresholdTable};
use hydromon_server::app;
use hydromon_server::config::ServerConfig;
use hydromon_server::ingest::{self, ReadingIngest};
use hydromon_server::state::AppState;
use hydromon_storage::sqlite::SqliteLogStore;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tower::util::ServiceExt;

pub struct TestContext {
    pub temp_dir: TempDir,
    pub state: AppState,
    pub app: axum::Router,
    pub worker: JoinHandle<()>,
}

pub async fn build_test_context() -> Result<TestContext> {
    hydromon_common::id::init(1, 1);

    let temp_dir = tempfile::tempdir()?;
    let store = Arc::new(SqliteLogStore::new(temp_dir.path())?);
    let thresholds = Arc::new(ThresholdTable::default());
    let engine = Arc::new(Mutex::new(
        AlertEngine::new(thresholds.clone(), store.clone()).with_history_capacity(50),
    ));

    let (reading_ingest, rx) = ReadingIngest::new();
    let worker = ingest::spawn_worker(engine.clone(), rx);

    let config = ServerConfig {
        data_dir: temp_dir.path().to_string_lossy().to_string(),
        history_capacity: 50,
        ..ServerConfig::default()
    };

    let state = AppState {
        engine,
        store,
        thresholds,
        ingest: Arc::new(reading_ingest),
        start_time: Utc::now(),
        config: Arc::new(config),
    };

    let app = app::build_http_app(state.clone());

    Ok(TestContext {
        temp_dir,
        state,
        app,
        worker,
    })
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value, Option<String>) {
    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");

    let status = resp.status();
    let trace_id = resp
        .headers()
        .get("x-trace-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, json, trace_id)
}

pub async fn request_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Value,
) -> (StatusCode, Value, Option<String>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build");
    send(app, req).await
}

pub async fn request_raw(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: &str,
) -> (StatusCode, Value, Option<String>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build");
    send(app, req).await
}

pub async fn request_no_body(
    app: &axum::Router,
    method: &str,
    uri: &str,
) -> (StatusCode, Value, Option<String>) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    send(app, req).await
}

/// Evaluates `reading` synchronously and asserts the call succeeded.
pub async fn evaluate(app: &axum::Router, reading: Value) -> Value {
    let (status, body, _) = request_json(app, "POST", "/v1/readings/evaluate", reading).await;
    assert_eq!(status, StatusCode::OK, "evaluate failed: {body}");
    assert_eq!(body["err_code"], 0);
    body["data"].clone()
}

/// Polls `check` until it holds or about a second has passed.
pub async fn eventually<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
