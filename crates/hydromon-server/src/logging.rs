use crate::api::error_response;
use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use rand::Rng;
use std::fmt::Write;
use std::time::Instant;

/// Per-request trace id, inserted into request extensions by
/// [`request_logging`] and echoed in every response envelope.
#[derive(Clone)]
pub struct TraceId(pub String);

impl std::ops::Deref for TraceId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

/// 16 hex chars from 8 random bytes.
fn generate_trace_id() -> String {
    let bytes: [u8; 8] = rand::thread_rng().gen();
    let mut s = String::with_capacity(16);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Largest POST body accepted.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Readings are small; anything past this is cut from the log line.
const MAX_BODY_LOG_CHARS: usize = 200;

fn truncate_body(bytes: &[u8], max: usize) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) if s.len() > max => {
            let mut end = max;
            while end > 0 && !s.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...", &s[..end])
        }
        Ok(s) => s.to_string(),
        Err(_) => "<non-utf8 body>".to_string(),
    }
}

fn format_elapsed(elapsed_us: u128) -> String {
    if elapsed_us < 1000 {
        format!("{elapsed_us}µs")
    } else if elapsed_us < 1_000_000 {
        format!("{}ms", elapsed_us / 1000)
    } else {
        format!("{:.1}s", elapsed_us as f64 / 1_000_000.0)
    }
}

/// Request/response logging middleware.
///
/// Logs `--> request` with the (truncated) body of reading submissions and
/// `<-- response` with status and elapsed time, at a level matching the
/// status class. Sets the `X-Trace-Id` response header.
pub async fn request_logging(mut req: Request, next: Next) -> Response {
    let trace_id = generate_trace_id();
    req.extensions_mut().insert(TraceId(trace_id.clone()));

    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = uri.path().to_string();

    if path.starts_with("/docs") {
        return next.run(req).await;
    }

    let url = match uri.query() {
        Some(query) if !query.is_empty() => format!("{path}?{query}"),
        _ => path.clone(),
    };

    let (req, body_snippet) = if method == Method::POST {
        let (parts, body) = req.into_parts();
        let body_bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    trace_id = %trace_id,
                    method = %method,
                    path = %url,
                    error = %e,
                    "--> request body rejected"
                );
                let mut response = error_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    &trace_id,
                    "payload_too_large",
                    "Request body exceeds 1 MiB",
                );
                if let Ok(val) = HeaderValue::from_str(&trace_id) {
                    response.headers_mut().insert("X-Trace-Id", val);
                }
                return response;
            }
        };
        let snippet = truncate_body(&body_bytes, MAX_BODY_LOG_CHARS);
        (Request::from_parts(parts, Body::from(body_bytes)), snippet)
    } else {
        (req, String::new())
    };

    if body_snippet.is_empty() {
        tracing::info!(trace_id = %trace_id, method = %method, path = %url, "--> request");
    } else {
        tracing::info!(
            trace_id = %trace_id,
            method = %method,
            path = %url,
            body = %body_snippet,
            "--> request"
        );
    }

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = format_elapsed(start.elapsed().as_micros());
    let status = response.status();
    let status_code = status.as_u16();

    if status.is_server_error() {
        tracing::error!(trace_id = %trace_id, status = status_code, elapsed = %elapsed, "<-- response");
    } else if status.is_client_error() {
        tracing::warn!(trace_id = %trace_id, status = status_code, elapsed = %elapsed, "<-- response");
    } else {
        tracing::info!(trace_id = %trace_id, status = status_code, elapsed = %elapsed, "<-- response");
    }

    if let Ok(val) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert("X-Trace-Id", val);
    }
    response
}
