//! Persistence gateway.
//!
//! # Responsibilities
//! - Validate raw identifiers before any store lookup
//! - Clamp list limits
//! - Refuse empty patches
//! - Record one store-operation metric per call
//!
//! # Design Decisions
//! - Holds the store behind `Arc<dyn TodoStore>` so the backend is picked
//!   once at startup and handlers never see it
//! - Raw `&str` ids enter here; stores only ever receive `TodoId`

use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::observability::metrics;
use crate::store::TodoStore;
use crate::todos::id::TodoId;
use crate::todos::types::{NewTodo, Todo, TodoPatch};

/// Limit applied when the caller gives none.
pub const DEFAULT_LIST_LIMIT: u32 = 100;
/// Upper bound for a single list call.
pub const MAX_LIST_LIMIT: u32 = 1000;

/// Entry point for todo persistence.
#[derive(Clone)]
pub struct TodoGateway {
    store: Arc<dyn TodoStore>,
}

impl TodoGateway {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    /// Backend name of the underlying store.
    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// List up to `limit` todos; `None` means the default, larger values
    /// are clamped.
    pub async fn list(&self, limit: Option<u32>) -> ApiResult<Vec<Todo>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        record("list", self.store.list(limit).await)
    }

    pub async fn get(&self, raw_id: &str) -> ApiResult<Todo> {
        let id = self.parse_id(raw_id)?;
        record("get", self.store.get(&id).await)
    }

    pub async fn create(&self, todo: NewTodo) -> ApiResult<Todo> {
        let created = record("create", self.store.create(todo).await)?;
        tracing::info!(id = %created.id, backend = self.backend(), "Todo created");
        Ok(created)
    }

    /// Merge `patch` onto an existing todo.
    pub async fn update(&self, raw_id: &str, patch: TodoPatch) -> ApiResult<Todo> {
        let id = self.parse_id(raw_id)?;
        if patch.is_empty() {
            return Err(ApiError::validation("At least one field must be provided"));
        }
        record("update", self.store.update(&id, patch).await)
    }

    pub async fn update_completion(&self, raw_id: &str, completed: bool) -> ApiResult<Todo> {
        let id = self.parse_id(raw_id)?;
        record(
            "update_completion",
            self.store.update_completion(&id, completed).await,
        )
    }

    /// Delete a todo. A second delete of the same id is NotFound.
    pub async fn delete(&self, raw_id: &str) -> ApiResult<bool> {
        let id = self.parse_id(raw_id)?;
        let deleted = record("delete", self.store.delete(&id).await)?;
        tracing::info!(id = %id, backend = self.backend(), "Todo deleted");
        Ok(deleted)
    }

    fn parse_id(&self, raw_id: &str) -> ApiResult<TodoId> {
        self.store.validate_id(raw_id)
    }
}

fn record<T>(operation: &'static str, result: ApiResult<T>) -> ApiResult<T> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(ApiError::NotFound(_)) => "not_found",
        Err(ApiError::Timeout(_)) => "timeout",
        Err(ApiError::Unavailable(_)) => "unavailable",
        Err(_) => "error",
    };
    metrics::record_store_operation(operation, outcome);

    if let Err(e) = &result {
        if e.status().is_server_error() || matches!(e, ApiError::Timeout(_)) {
            tracing::warn!(operation, error = %e, "Store operation failed");
        }
    }
    result
}
