//! Todo domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::todos::id::TodoId;

/// A persisted todo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Assigned by the store at creation; never changes.
    pub id: TodoId,
    /// 1 to 2000 characters, trimmed.
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a todo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub description: String,
    pub completed: bool,
}

/// Fields to merge onto an existing record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn completion(completed: bool) -> Self {
        Self {
            description: None,
            completed: Some(completed),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.completed.is_none()
    }

    /// Merge onto `todo` in memory, bumping `updated_at`.
    pub fn apply(self, todo: &mut Todo, now: DateTime<Utc>) {
        if let Some(description) = self.description {
            todo.description = description;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        todo.updated_at = now;
    }
}

impl From<NewTodo> for TodoPatch {
    fn from(todo: NewTodo) -> Self {
        Self {
            description: Some(todo.description),
            completed: Some(todo.completed),
        }
    }
}
