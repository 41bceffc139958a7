//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → security (rate limit, audit)
//!     → handlers.rs
//!         → request.rs (sanitize + parse input)
//!         → todos (validate, gateway)
//!         → response.rs (success envelope)
//!     → Send to client
//! ```

pub mod handlers;
pub mod openapi;
pub mod request;
pub mod response;
pub mod server;

pub use response::ApiResponse;
pub use server::{build_router, AppState, HttpServer};
