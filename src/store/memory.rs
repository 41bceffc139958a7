//! In-memory todo store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use mongodb::bson::oid::ObjectId;

use crate::error::ApiResult;
use crate::store::{not_found, TodoStore};
use crate::todos::id::TodoId;
use crate::todos::types::{NewTodo, Todo, TodoPatch};

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    todo: Todo,
}

/// A thread-safe store backed by a `DashMap`.
///
/// Ids are generated in the same encoding as the document store so both
/// backends are interchangeable behind `TodoStore`.
#[derive(Clone, Default)]
pub struct MemoryTodoStore {
    inner: Arc<DashMap<TodoId, Entry>>,
    next_seq: Arc<AtomicU64>,
}

impl MemoryTodoStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn generate_id() -> ApiResult<TodoId> {
        TodoId::parse(&ObjectId::new().to_hex())
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn list(&self, limit: u32) -> ApiResult<Vec<Todo>> {
        let mut entries: Vec<Entry> = self.inner.iter().map(|r| r.value().clone()).collect();
        entries.sort_by_key(|e| e.seq);

        Ok(entries
            .into_iter()
            .take(limit as usize)
            .map(|e| e.todo)
            .collect())
    }

    async fn get(&self, id: &TodoId) -> ApiResult<Todo> {
        self.inner
            .get(id)
            .map(|r| r.value().todo.clone())
            .ok_or_else(|| not_found(id))
    }

    async fn create(&self, todo: NewTodo) -> ApiResult<Todo> {
        let now = Utc::now();
        let record = Todo {
            id: Self::generate_id()?,
            description: todo.description,
            completed: todo.completed,
            created_at: now,
            updated_at: now,
        };

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.inner.insert(
            record.id.clone(),
            Entry {
                seq,
                todo: record.clone(),
            },
        );
        Ok(record)
    }

    async fn update(&self, id: &TodoId, patch: TodoPatch) -> ApiResult<Todo> {
        // get_mut holds the shard lock, so the merge is atomic per record.
        let mut entry = self.inner.get_mut(id).ok_or_else(|| not_found(id))?;
        patch.apply(&mut entry.todo, Utc::now());
        Ok(entry.todo.clone())
    }

    async fn update_completion(&self, id: &TodoId, completed: bool) -> ApiResult<Todo> {
        self.update(id, TodoPatch::completion(completed)).await
    }

    async fn delete(&self, id: &TodoId) -> ApiResult<bool> {
        self.inner
            .remove(id)
            .map(|_| true)
            .ok_or_else(|| not_found(id))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn new_todo(description: &str) -> NewTodo {
        NewTodo {
            description: description.to_string(),
            completed: false,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_object_id() {
        let store = MemoryTodoStore::new();
        let todo = store.create(new_todo("buy milk")).await.unwrap();

        assert_eq!(todo.id.as_str().len(), 24);
        assert_eq!(todo.created_at, todo.updated_at);
        assert_eq!(store.get(&todo.id).await.unwrap(), todo);
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order_and_limit() {
        let store = MemoryTodoStore::new();
        for i in 0..5 {
            store.create(new_todo(&format!("todo {i}"))).await.unwrap();
        }

        let all = store.list(100).await.unwrap();
        let descriptions: Vec<_> = all.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, vec!["todo 0", "todo 1", "todo 2", "todo 3", "todo 4"]);

        assert_eq!(store.list(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let store = MemoryTodoStore::new();
        let todo = store.create(new_todo("walk the dog")).await.unwrap();

        let updated = store.update_completion(&todo.id, true).await.unwrap();
        assert_eq!(updated.description, "walk the dog");
        assert!(updated.completed);
        assert!(updated.updated_at >= todo.updated_at);
        assert_eq!(updated.created_at, todo.created_at);
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let store = MemoryTodoStore::new();
        let id = TodoId::parse("507f1f77bcf86cd799439011").unwrap();

        assert!(matches!(store.get(&id).await, Err(ApiError::NotFound(_))));
        assert!(matches!(
            store.update(&id, TodoPatch::completion(true)).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(store.delete(&id).await, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let store = MemoryTodoStore::new();
        let todo = store.create(new_todo("once")).await.unwrap();

        assert!(store.delete(&todo.id).await.unwrap());
        assert!(store.is_empty());
        assert!(matches!(store.delete(&todo.id).await, Err(ApiError::NotFound(_))));
    }
}
