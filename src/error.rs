//! Error taxonomy and JSON envelope rendering.
//!
//! # Responsibilities
//! - Classify every failure the service can produce
//! - Map each class to an HTTP status, a stable `code` and a `name`
//! - Render the `{success, error, timestamp}` envelope
//!
//! # Design Decisions
//! - `IntoResponse` always renders the production-safe envelope; the
//!   error is stashed in the response extensions so `expose_error_details`
//!   can re-render it with internal causes outside production
//! - Field-level violations are client-facing and always rendered
//! - The rate limiter does not raise; the middleware builds `RateLimited`
//!   from its decision

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::Environment;

/// Message sent to clients instead of the cause of a 500 in production.
const GENERIC_SERVER_MESSAGE: &str = "Internal server error";
const TIMEOUT_MESSAGE: &str = "Request timed out";
const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable";

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Malformed or missing input.
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<FieldViolation>,
    },

    /// Well-formed reference to a record that does not exist.
    #[error("{0}")]
    NotFound(String),

    /// No route matched the request.
    #[error("Route {method} {path} not found")]
    RouteNotFound { method: String, path: String },

    /// Generic client-caused failure.
    #[error("{message}")]
    Client { status: StatusCode, message: String },

    /// Fixed-window budget exhausted.
    #[error("Too many requests, please try again later")]
    RateLimited {
        limit: u32,
        window_ms: u64,
        reset_at_ms: u64,
    },

    /// The document store did not answer in time.
    #[error("{0}")]
    Timeout(String),

    /// The document store could not be reached.
    #[error("{0}")]
    Unavailable(String),

    /// Any other failure reported by the document store.
    #[error("{0}")]
    Database(String),

    /// Unclassified fault.
    #[error("{0}")]
    Internal(String),
}

/// Result alias used across the crate.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Validation failure without field details.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Validation failure for a single field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Validation {
            details: vec![FieldViolation::new(field, message.clone())],
            message,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Client fault with the default 422 status.
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Client { status, .. } => *status,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::RouteNotFound { .. } => "ROUTE_NOT_FOUND",
            Self::Client { .. } => "CLIENT_ERROR",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Timeout(_) => "TIMEOUT_ERROR",
            Self::Unavailable(_) => "CONNECTION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::NotFound(_) | Self::RouteNotFound { .. } => "NotFoundError",
            Self::Client { .. } => "ClientError",
            Self::RateLimited { .. } => "RateLimitError",
            Self::Timeout(_) => "TimeoutError",
            Self::Unavailable(_) => "ServiceUnavailableError",
            Self::Database(_) => "DatabaseError",
            Self::Internal(_) => "ServerError",
        }
    }

    /// Fixed client-facing message for variants that carry an internal cause.
    fn public_message(&self) -> Option<&'static str> {
        match self {
            Self::Timeout(_) => Some(TIMEOUT_MESSAGE),
            Self::Unavailable(_) => Some(UNAVAILABLE_MESSAGE),
            Self::Database(_) | Self::Internal(_) => Some(GENERIC_SERVER_MESSAGE),
            _ => None,
        }
    }

    /// Build the error envelope.
    ///
    /// With `expose_internals` unset, store and server failures carry a fixed
    /// message and their internal causes are left out.
    pub fn envelope(&self, expose_internals: bool) -> ErrorEnvelope {
        let message = match self.public_message() {
            Some(public) if !expose_internals => public.to_string(),
            _ => self.to_string(),
        };

        let details = match self {
            Self::Validation { details, .. } if !details.is_empty() => {
                Some(json!({ "errors": details }))
            }
            Self::RateLimited {
                limit,
                window_ms,
                reset_at_ms,
            } => Some(json!({
                "limit": limit,
                "window": format!("{}s", window_ms / 1000),
                "remaining": 0,
                "resetTime": millis_to_rfc3339(*reset_at_ms),
            })),
            Self::Timeout(cause)
            | Self::Unavailable(cause)
            | Self::Database(cause)
            | Self::Internal(cause)
                if expose_internals =>
            {
                Some(json!({ "cause": cause, "originalError": self.name() }))
            }
            _ => None,
        };

        ErrorEnvelope {
            success: false,
            error: ErrorBody {
                name: self.name(),
                message,
                code: self.code(),
                details,
            },
            timestamp: now_rfc3339(),
        }
    }

    fn render(&self, expose_internals: bool) -> Response {
        (self.status(), Json(self.envelope(expose_internals))).into_response()
    }
}

/// `{success: false, error, timestamp}`.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub name: &'static str,
    pub message: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Marker carried in response extensions so outer layers can re-render.
#[derive(Debug, Clone)]
pub struct RenderedError(pub ApiError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "Request rejected");
        }

        let mut response = self.render(false);
        response.extensions_mut().insert(RenderedError(self));
        response
    }
}

/// Re-render errors with internal causes outside production.
pub async fn expose_error_details(
    State(environment): State<Environment>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if environment.is_production() {
        return response;
    }

    let Some(RenderedError(error)) = response.extensions().get::<RenderedError>().cloned() else {
        return response;
    };

    let (parts, _) = response.into_parts();
    let detailed = error.render(true);
    let (_, body) = detailed.into_parts();
    let mut response = Response::from_parts(parts, body);
    response.headers_mut().remove(axum::http::header::CONTENT_LENGTH);
    response
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn millis_to_rfc3339(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_codes() {
        assert_eq!(ApiError::validation("bad").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("gone").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::client("nope").status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            ApiError::Unavailable("down".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ApiError::Timeout("slow".into()).status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(ApiError::Database("x".into()).code(), "DATABASE_ERROR");
        assert_eq!(ApiError::Internal("x".into()).name(), "ServerError");
    }

    #[test]
    fn test_internal_message_hidden_without_exposure() {
        let err = ApiError::Database("connection reset by peer".into());

        let public = serde_json::to_value(err.envelope(false)).unwrap();
        assert_eq!(public["success"], false);
        assert_eq!(public["error"]["message"], GENERIC_SERVER_MESSAGE);
        assert!(public["error"].get("details").is_none());

        let detailed = serde_json::to_value(err.envelope(true)).unwrap();
        assert_eq!(detailed["error"]["message"], "connection reset by peer");
        assert_eq!(detailed["error"]["details"]["cause"], "connection reset by peer");
    }

    #[test]
    fn test_validation_details_always_rendered() {
        let err = ApiError::invalid_field("description", "Description cannot be empty");
        let body = serde_json::to_value(err.envelope(false)).unwrap();

        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["name"], "ValidationError");
        assert_eq!(body["error"]["details"]["errors"][0]["field"], "description");
    }

    #[test]
    fn test_store_causes_hidden_without_exposure() {
        let cause = "Server selection timeout: No available servers. Address: 10.0.0.7:27017";

        for err in [
            ApiError::Unavailable(cause.into()),
            ApiError::Timeout(cause.into()),
        ] {
            let public = serde_json::to_value(err.envelope(false)).unwrap();
            let text = public.to_string();
            assert!(!text.contains("10.0.0.7"), "leaked: {text}");
            assert!(public["error"].get("details").is_none());

            let detailed = serde_json::to_value(err.envelope(true)).unwrap();
            assert_eq!(detailed["error"]["details"]["cause"], cause);
        }

        let body = serde_json::to_value(ApiError::Unavailable(cause.into()).envelope(false)).unwrap();
        assert_eq!(body["error"]["message"], UNAVAILABLE_MESSAGE);
        let body = serde_json::to_value(ApiError::Timeout(cause.into()).envelope(false)).unwrap();
        assert_eq!(body["error"]["message"], TIMEOUT_MESSAGE);
    }

    #[test]
    fn test_into_response_attaches_marker() {
        let response = ApiError::not_found("Todo with ID x not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<RenderedError>().is_some());
    }

    #[test]
    fn test_millis_to_rfc3339() {
        assert_eq!(millis_to_rfc3339(0), "1970-01-01T00:00:00.000Z");
    }
}
