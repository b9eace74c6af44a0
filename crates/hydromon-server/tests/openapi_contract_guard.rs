mod common;

use anyhow::{anyhow, Result};
use common::{build_test_context, request_no_body};
use std::collections::BTreeSet;

#[tokio::test]
async fn openapi_paths_match_served_routes() -> Result<()> {
    let ctx = build_test_context().await?;
    let (status, body, _) = request_no_body(&ctx.app, "GET", "/v1/openapi.json").await;
    assert_eq!(status, axum::http::StatusCode::OK);

    let Some(paths) = body["paths"].as_object() else {
        return Err(anyhow!("openapi paths should be object"));
    };

    let mut exposed: BTreeSet<String> = BTreeSet::new();
    for (path, methods) in paths {
        let Some(methods) = methods.as_object() else {
            return Err(anyhow!("path methods should be object for {path}"));
        };
        for method in methods.keys() {
            exposed.insert(format!("{} {path}", method.to_ascii_uppercase()));
        }
    }

    let expected: BTreeSet<String> = [
        "GET /v1/health",
        "POST /v1/readings",
        "POST /v1/readings/evaluate",
        "GET /v1/alerts/active",
        "GET /v1/alerts/history",
        "GET /v1/thresholds",
        "GET /v1/logs",
        "GET /v1/logs/{id}",
    ]
    .into_iter()
    .map(|s| s.to_string())
    .collect();

    assert_eq!(exposed, expected);
    Ok(())
}

#[tokio::test]
async fn openapi_limit_params_are_optional() -> Result<()> {
    let ctx = build_test_context().await?;
    let (_, body, _) = request_no_body(&ctx.app, "GET", "/v1/openapi.json").await;
    let paths = body["paths"]
        .as_object()
        .ok_or_else(|| anyhow!("openapi paths should be object"))?;

    for path in ["/v1/alerts/history", "/v1/logs"] {
        let operation = paths
            .get(path)
            .and_then(|item| item.get("get"))
            .ok_or_else(|| anyhow!("missing GET operation for path {path}"))?;
        let Some(parameters) = operation["parameters"].as_array() else {
            return Err(anyhow!("missing parameters for GET {path}"));
        };
        let limit = parameters
            .iter()
            .find(|p| p["in"].as_str() == Some("query") && p["name"].as_str() == Some("limit"))
            .ok_or_else(|| anyhow!("missing limit parameter on GET {path}"))?;
        let required = limit
            .get("required")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        assert!(!required, "limit on GET {path} should be optional");
    }
    Ok(())
}

#[tokio::test]
async fn openapi_log_entry_schema_exposes_resolution_fields() -> Result<()> {
    let ctx = build_test_context().await?;
    let (_, body, _) = request_no_body(&ctx.app, "GET", "/v1/openapi.json").await;
    let schemas = body["components"]["schemas"]
        .as_object()
        .ok_or_else(|| anyhow!("openapi components.schemas should be object"))?;

    let issue = schemas
        .get("IssueResponse")
        .ok_or_else(|| anyhow!("IssueResponse schema should exist"))?;
    let props = issue["properties"]
        .as_object()
        .ok_or_else(|| anyhow!("IssueResponse.properties should be object"))?;
    for field in ["parameter", "value", "threshold", "resolved_at", "duration_minutes", "triggered_id"] {
        assert!(props.contains_key(field), "IssueResponse should contain {field}");
    }
    Ok(())
}
