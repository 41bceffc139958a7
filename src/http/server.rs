//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing, security, rate limiting)
//! - Bind the server to a listener and serve until shutdown
//!
//! # Middleware Order (outermost first)
//! ```text
//! SetRequestId → Trace → PropagateRequestId → security headers
//!     → expose_error_details → rate limit → CORS → reject over budget
//!     → audit → timeout → handler
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::{expose_error_details, ApiError};
use crate::http::handlers;
use crate::security::audit::audit_middleware;
use crate::security::cors::cors_layer;
use crate::security::headers::with_security_headers;
use crate::security::rate_limit::{rate_limit_middleware, reject_rate_limited, FixedWindowLimiter};
use crate::todos::{ContentPolicy, TodoGateway};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub gateway: TodoGateway,
    pub limiter: Arc<FixedWindowLimiter>,
    pub config: Arc<AppConfig>,
    pub content_policy: Arc<ContentPolicy>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, gateway: TodoGateway) -> Self {
        Self {
            limiter: Arc::new(FixedWindowLimiter::new(&config.rate_limit)),
            content_policy: Arc::new(ContentPolicy::new(&config.security.blocked_terms)),
            config: Arc::new(config),
            gateway,
            started_at: Instant::now(),
        }
    }
}

/// HTTP server for the todo API.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and gateway.
    pub fn new(config: AppConfig, gateway: TodoGateway) -> Self {
        let state = AppState::new(config, gateway);
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.state.config.server.environment,
            backend = self.state.gateway.backend(),
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.state.config
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let todos = Router::new()
        .route(
            "/todos",
            get(handlers::list_todos)
                .post(handlers::create_todo)
                .fallback(handlers::route_not_found),
        )
        .route(
            "/todos/{id}",
            get(handlers::get_todo)
                .put(handlers::replace_todo)
                .patch(handlers::update_completion)
                .delete(handlers::delete_todo)
                .fallback(handlers::route_not_found),
        );

    let api = if config.server.api_prefix == "/" {
        todos
    } else {
        Router::new().nest(&config.server.api_prefix, todos)
    };

    let router = api
        .route("/health", get(handlers::health))
        .route(
            &format!("{}/json", config.server.docs_path.trim_end_matches('/')),
            get(handlers::openapi_json),
        )
        .fallback(handlers::route_not_found)
        .with_state(state.clone())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    reject_rate_limited,
                ))
                .layer(middleware::from_fn_with_state(state.clone(), audit_middleware))
                .layer(middleware::from_fn_with_state(
                    Duration::from_secs(config.limits.request_timeout_secs),
                    request_timeout,
                ))
                .layer(DefaultBodyLimit::max(config.limits.max_body_size)),
        )
        .layer(cors_layer(&config.security, config.server.environment))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            config.server.environment,
            expose_error_details,
        ));

    let router = if config.security.enable_headers {
        with_security_headers(router, config.server.environment.is_production())
    } else {
        router
    };

    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v: &HeaderValue| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Fail requests that outlive `timeout` with a 408 envelope.
async fn request_timeout(
    State(timeout): State<Duration>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match tokio::time::timeout(timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "Request timed out");
            ApiError::Timeout("Request timed out".to_string()).into_response()
        }
    }
}
