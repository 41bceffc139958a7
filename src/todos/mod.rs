//! Todo domain.
//!
//! # Data Flow
//! ```text
//! sanitized JSON body
//!     → schema.rs (shape, types, lengths → NewTodo / TodoPatch)
//!     → gateway.rs (id check, limit clamp, empty-patch check)
//!         → store::TodoStore
//! ```

pub mod gateway;
pub mod id;
pub mod schema;
pub mod types;

pub use gateway::{TodoGateway, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
pub use id::{is_valid_id, TodoId};
pub use schema::{validate_completion, validate_create, validate_replace, ContentPolicy};
pub use types::{NewTodo, Todo, TodoPatch};
