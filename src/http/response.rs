//! Response construction.
//!
//! Health and status bodies are JSON and must never be cached by clients or
//! intermediaries.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::security::rate_limit::RateViolation;

const NO_CACHE: &str = "no-store, no-cache";
const EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// JSON response with caching disabled.
pub fn json(status: StatusCode, body: String) -> Response {
    let mut response = (status, Body::from(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static(EPOCH));
    response
}

/// 500 with a JSON error body.
pub fn internal_error(message: &str) -> Response {
    let body = serde_json::json!({ "error": message });
    json(StatusCode::INTERNAL_SERVER_ERROR, body.to_string())
}

/// 429 for a denied request.
pub fn rate_limited(violation: &RateViolation) -> Response {
    // Round up so clients never retry inside the window.
    let retry_after_secs = violation.retry_after.as_secs()
        + u64::from(violation.retry_after.subsec_nanos() > 0);
    let retry_after_secs = retry_after_secs.max(1);

    let body = serde_json::json!({
        "error": "rate limit exceeded",
        "rule": violation.rule,
        "max_requests": violation.max_requests,
        "window_secs": violation.window.as_secs(),
        "retry_after_secs": retry_after_secs,
    });

    let mut response = json(StatusCode::TOO_MANY_REQUESTS, body.to_string());
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
    response
}
