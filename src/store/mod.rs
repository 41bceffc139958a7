//! Persistence backends.
//!
//! # Data Flow
//! ```text
//! TodoGateway (todos/gateway.rs)
//!     → TodoStore trait
//!         → mongo.rs   (MongoDB collection, production)
//!         → memory.rs  (DashMap, tests and local runs)
//! ```
//!
//! # Design Decisions
//! - Stores receive only validated `TodoId`s; raw strings stop at `validate_id`
//! - Mutations are single atomic operations (find-and-modify), never
//!   read-then-write
//! - A missing record is `ApiError::NotFound`, never an `Option`

pub mod memory;
pub mod mongo;

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::todos::id::TodoId;
use crate::todos::types::{NewTodo, Todo, TodoPatch};

pub use memory::MemoryTodoStore;
pub use mongo::MongoTodoStore;

/// Capability contract for a todo document store.
#[async_trait]
pub trait TodoStore: Send + Sync + 'static {
    /// Check the identifier shape before any lookup.
    fn validate_id(&self, raw: &str) -> ApiResult<TodoId> {
        TodoId::parse(raw)
    }

    /// Up to `limit` records in insertion order.
    async fn list(&self, limit: u32) -> ApiResult<Vec<Todo>>;

    async fn get(&self, id: &TodoId) -> ApiResult<Todo>;

    /// Persist a new record and return it with its assigned id.
    async fn create(&self, todo: NewTodo) -> ApiResult<Todo>;

    /// Merge `patch` onto the stored record.
    async fn update(&self, id: &TodoId, patch: TodoPatch) -> ApiResult<Todo>;

    async fn update_completion(&self, id: &TodoId, completed: bool) -> ApiResult<Todo>;

    /// Remove the record; fails with NotFound when it does not exist.
    async fn delete(&self, id: &TodoId) -> ApiResult<bool>;

    /// Short backend name for logs and metrics.
    fn backend(&self) -> &'static str;
}

pub(crate) fn not_found(id: &TodoId) -> crate::error::ApiError {
    crate::error::ApiError::not_found(format!("Todo with ID {id} not found"))
}
