//! Fixed-window rate limiting middleware.
//!
//! # Responsibilities
//! - Count requests per client identity in fixed time windows
//! - Reject requests over budget with 429 and `Retry-After`
//! - Advertise the budget with `X-RateLimit-*` headers on every response
//!
//! # Design Decisions
//! - Bucket key is `{prefix}{identity}:{window index}`, so a new window is
//!   a new bucket and no reset bookkeeping is needed
//! - Expired buckets are swept on every check, bounding memory by the
//!   number of clients active in the current window
//! - The limiter is an explicit instance in app state, not a global

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::RateLimitConfig;
use crate::error::ApiError;
use crate::http::AppState;
use crate::observability::metrics;
use crate::security::sanitize::sanitize_str;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
const X_USER_ID: &str = "x-user-id";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Identity used when nothing better is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy)]
struct WindowBucket {
    count: u32,
    reset_at_ms: u64,
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub limited: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Epoch milliseconds at which the current window ends.
    pub reset_at_ms: u64,
    /// Requests counted in the window, this one included.
    pub total_hits: u32,
    /// The identity bypassed limiting.
    pub exempt: bool,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, at least 1.
    pub fn retry_after_secs(&self, now_ms: u64) -> u64 {
        self.reset_at_ms.saturating_sub(now_ms).div_ceil(1000).max(1)
    }
}

/// Per-identity fixed-window counter.
pub struct FixedWindowLimiter {
    buckets: Mutex<HashMap<String, WindowBucket>>,
    window_ms: u64,
    max_requests: u32,
    key_prefix: String,
    exempt_loopback: bool,
}

impl FixedWindowLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            window_ms: config.window_ms.max(1),
            max_requests: config.max_requests,
            key_prefix: config.key_prefix.clone(),
            exempt_loopback: config.exempt_loopback,
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Number of live buckets.
    pub fn tracked(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Count a request from `identifier` now.
    pub fn check(&self, identifier: &str) -> RateLimitDecision {
        self.check_at(identifier, now_ms())
    }

    /// Loopback peers bypass the limiter when configured.
    pub fn exempts(&self, client_ip: Option<&str>) -> bool {
        self.exempt_loopback && client_ip.is_some_and(is_loopback_identity)
    }

    /// Decision reported for exempt clients; nothing is counted.
    pub fn exempt_decision(&self) -> RateLimitDecision {
        let now_ms = now_ms();
        RateLimitDecision {
            limited: false,
            limit: self.max_requests,
            remaining: self.max_requests,
            reset_at_ms: (now_ms / self.window_ms + 1) * self.window_ms,
            total_hits: 0,
            exempt: true,
        }
    }

    /// Count a request from `identifier` at `now_ms`.
    pub fn check_at(&self, identifier: &str, now_ms: u64) -> RateLimitDecision {
        let window_index = now_ms / self.window_ms;
        let reset_at_ms = (window_index + 1) * self.window_ms;

        let key = format!("{}{}:{}", self.key_prefix, identifier, window_index);
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);

        // 1. Sweep buckets from past windows.
        buckets.retain(|_, bucket| bucket.reset_at_ms > now_ms);

        // 2. Count this request.
        let bucket = buckets.entry(key).or_insert(WindowBucket {
            count: 0,
            reset_at_ms,
        });
        bucket.count = bucket.count.saturating_add(1);

        RateLimitDecision {
            limited: bucket.count > self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(bucket.count),
            reset_at_ms: bucket.reset_at_ms,
            total_hits: bucket.count,
            exempt: false,
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// `localhost` or a loopback IP literal.
pub fn is_loopback_identity(identifier: &str) -> bool {
    identifier == "localhost"
        || identifier
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false)
}

/// Client IP: the first `X-Forwarded-For` entry when proxy headers are
/// trusted, else the socket peer.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> Option<String> {
    if trust_proxy_headers {
        let forwarded = headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return Some(ip.to_string());
        }
    }
    peer.map(|addr| addr.ip().to_string())
}

/// Identity to count against: sanitized `X-User-Id`, else client IP,
/// else `"unknown"`.
pub fn client_identity(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> String {
    let user = headers
        .get(X_USER_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(sanitize_str);

    user.or_else(|| client_ip(headers, peer, trust_proxy_headers))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Apply the limiter to every request.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let config = &state.config.rate_limit;
    if !config.enabled {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(request.headers(), peer, config.trust_proxy_headers);
    let identity = client_identity(request.headers(), peer, config.trust_proxy_headers);
    let decision = if state.limiter.exempts(ip.as_deref()) {
        state.limiter.exempt_decision()
    } else {
        state.limiter.check(&identity)
    };

    if decision.limited {
        tracing::warn!(
            target: "security",
            client = %identity,
            hits = decision.total_hits,
            limit = decision.limit,
            path = %request.uri().path(),
            "Rate limit exceeded"
        );
        metrics::record_rate_limited();
    }

    request.extensions_mut().insert(decision);
    let mut response = next.run(request).await;

    set_rate_limit_headers(response.headers_mut(), &decision);
    if decision.limited && response.status() == StatusCode::TOO_MANY_REQUESTS {
        if let Ok(value) = HeaderValue::from_str(&decision.retry_after_secs(now_ms()).to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }
    response
}

/// Answer 429 for requests the limiter marked as over budget.
///
/// Runs inside the CORS layer so rejections still carry CORS headers, while
/// `rate_limit_middleware` sits outside it and counts preflights too.
pub async fn reject_rate_limited(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match request.extensions().get::<RateLimitDecision>() {
        Some(decision) if decision.limited => ApiError::RateLimited {
            limit: decision.limit,
            window_ms: state.limiter.window_ms(),
            reset_at_ms: decision.reset_at_ms,
        }
        .into_response(),
        _ => next.run(request).await,
    }
}

fn set_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_at_ms / 1000));
}
