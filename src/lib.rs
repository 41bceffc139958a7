//! Todo CRUD service library.
//!
//! # Architecture Overview
//!
//! ```text
//!  request → http (router, middleware)
//!              → security (rate limit, audit, sanitize)
//!              → todos (schema validation, gateway)
//!                  → store (mongo | memory)
//!  response ← ApiResponse / ApiError envelope
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod store;
pub mod todos;

pub use config::schema::AppConfig;
pub use error::{ApiError, ApiResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
