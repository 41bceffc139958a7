//! Request input extraction.
//!
//! # Responsibilities
//! - Turn extractor rejections into `ApiError`s
//! - Sanitize path, query and body input before validation
//! - Parse the `limit` query parameter
//!
//! # Design Decisions
//! - Handlers take `Result<Json<Value>, JsonRejection>` and call in here, so
//!   malformed JSON renders the standard envelope instead of axum's text
//! - Suspicious bodies are logged and counted, then processed as usual

use std::collections::HashMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::observability::metrics;
use crate::security::sanitize::{contains_suspicious, sanitize_query, sanitize_str, sanitize_value};

/// Sanitized JSON body.
pub fn body(payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    let Json(value) = payload.map_err(json_rejection)?;

    if contains_suspicious(&value) {
        tracing::warn!(target: "security", source = "body", "Suspicious input detected");
        metrics::record_suspicious_input("body");
    }
    Ok(sanitize_value(value))
}

/// Sanitized path identifier; an undecodable segment is an invalid id.
pub fn path_id(path: Result<Path<String>, PathRejection>) -> ApiResult<String> {
    let Path(raw) = path.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Path rejected");
        ApiError::invalid_field("id", "Invalid ID format")
    })?;
    Ok(sanitize_str(&raw))
}

/// Sanitized query parameters.
pub fn query(
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> ApiResult<HashMap<String, String>> {
    let Query(params) = params.map_err(|e| ApiError::invalid_field("query", e.body_text()))?;
    Ok(sanitize_query(params))
}

/// `limit` from the query: absent → `None`; anything but a positive
/// integer → 400. Large values are left for the gateway to clamp.
pub fn limit(params: &HashMap<String, String>) -> ApiResult<Option<u32>> {
    let Some(raw) = params.get("limit") else {
        return Ok(None);
    };

    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ApiError::invalid_field(
            "limit",
            "Limit must be a positive integer",
        )),
        Ok(n) => Ok(Some(u32::try_from(n).unwrap_or(u32::MAX))),
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::Client {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "Request body too large".to_string(),
        },
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ApiError::Client {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            message: "Expected request with `Content-Type: application/json`".to_string(),
        },
        _ => ApiError::invalid_field("body", rejection.body_text()),
    }
}
