//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs / cors.rs (response hardening, cross-origin policy)
//!     → rate_limit.rs (fixed-window budget per client identity)
//!     → audit.rs (access log, suspicious path/query/header detection)
//!     → handlers: sanitize.rs on path, query and body before validation
//! ```
//!
//! # Design Decisions
//! - Sanitization runs before schema validation, so length limits apply to
//!   the escaped text
//! - Detection logs and counts; it does not reject
//! - No trust in forwarded headers unless configured

pub mod audit;
pub mod cors;
pub mod headers;
pub mod rate_limit;
pub mod sanitize;

pub use rate_limit::{client_identity, FixedWindowLimiter, RateLimitDecision};
pub use sanitize::{contains_suspicious, is_suspicious, sanitize_str, sanitize_value};
