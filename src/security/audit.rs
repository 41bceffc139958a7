//! Access log and suspicious-input detection.
//!
//! # Responsibilities
//! - One structured log line and one metric per request
//! - Flag suspicious path, query and header content under the `security`
//!   target
//!
//! # Design Decisions
//! - Runs inside the rate limiter so rejected requests are logged there,
//!   not twice
//! - Bodies are inspected by the handlers, after parsing

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::AppState;
use crate::observability::metrics;
use crate::security::rate_limit::client_ip;
use crate::security::sanitize::{is_suspicious, sanitize_headers};

const SKIPPED_HEADERS: &[&str] = &["cookie", "authorization"];

/// Log the request and any suspicious input in it.
pub async fn audit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(
        request.headers(),
        peer,
        state.config.rate_limit.trust_proxy_headers,
    )
    .unwrap_or_else(|| "unknown".to_string());

    for source in suspicious_sources(&request) {
        // Offending header values are logged escaped.
        let headers: Vec<(String, String)> = if source == "headers" {
            sanitize_headers(request.headers())
                .into_iter()
                .filter(|(name, _)| !SKIPPED_HEADERS.contains(&name.as_str()))
                .collect()
        } else {
            Vec::new()
        };
        tracing::warn!(
            target: "security",
            source,
            ip = %ip,
            method = %method,
            path = %path,
            headers = ?headers,
            "Suspicious input detected"
        );
        metrics::record_suspicious_input(source);
    }

    let response = next.run(request).await;
    let status = response.status().as_u16();
    metrics::record_request(&method, status, start);

    tracing::info!(
        method = %method,
        path = %path,
        status,
        ip = %ip,
        duration_ms = start.elapsed().as_millis() as u64,
        "Request handled"
    );
    response
}

fn suspicious_sources(request: &Request<Body>) -> Vec<&'static str> {
    let mut sources = Vec::new();
    let decoded_path = decode_for_inspection(request.uri().path());
    if is_suspicious(&decoded_path) {
        sources.push("path");
    }

    if let Some(query) = request.uri().query() {
        let decoded = url::form_urlencoded::parse(query.as_bytes())
            .any(|(k, v)| is_suspicious(&k) || is_suspicious(&v));
        if decoded {
            sources.push("query");
        }
    }

    let headers = request
        .headers()
        .iter()
        .filter(|(name, _)| !SKIPPED_HEADERS.contains(&name.as_str()))
        .filter_map(|(_, value)| value.to_str().ok())
        .any(is_suspicious);
    if headers {
        sources.push("headers");
    }
    sources
}

/// Percent-decode `path`; `+` also decodes to a space, which is fine for
/// pattern matching.
fn decode_for_inspection(path: &str) -> String {
    url::form_urlencoded::parse(path.as_bytes())
        .map(|(k, v)| if v.is_empty() { k.into_owned() } else { format!("{k}={v}") })
        .collect::<Vec<_>>()
        .join("&")
}
