//! MongoDB-backed todo store.
//!
//! # Responsibilities
//! - Connect and verify the deployment with a `ping`
//! - Map between `Todo` and the stored document shape
//! - Classify driver failures into the API error taxonomy
//!
//! # Design Decisions
//! - Updates and deletes use find-and-modify so the existence check and the
//!   write are one server-side operation
//! - Documents keep the driver's native `_id` (ObjectId) and BSON dates

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document},
    error::ErrorKind,
    options::{ClientOptions, ReturnDocument},
    Client, Collection,
};
use serde::{Deserialize, Serialize};

use crate::config::DatabaseConfig;
use crate::error::{ApiError, ApiResult};
use crate::store::{not_found, TodoStore};
use crate::todos::id::TodoId;
use crate::todos::types::{NewTodo, Todo, TodoPatch};

/// Stored shape of a todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TodoDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    description: String,
    completed: bool,
    #[serde(rename = "createdAt")]
    created_at: BsonDateTime,
    #[serde(rename = "updatedAt")]
    updated_at: BsonDateTime,
}

impl TodoDocument {
    fn into_todo(self) -> ApiResult<Todo> {
        let id = self
            .id
            .ok_or_else(|| ApiError::Database("document without _id".to_string()))?;

        Ok(Todo {
            id: TodoId::parse(&id.to_hex())?,
            description: self.description,
            completed: self.completed,
            created_at: to_chrono(self.created_at)?,
            updated_at: to_chrono(self.updated_at)?,
        })
    }
}

fn to_chrono(value: BsonDateTime) -> ApiResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis())
        .ok_or_else(|| ApiError::Database(format!("timestamp out of range: {value}")))
}

fn object_id(id: &TodoId) -> ApiResult<ObjectId> {
    ObjectId::parse_str(id.as_str()).map_err(|_| ApiError::invalid_field("id", "Invalid ID format"))
}

/// Todo store over a MongoDB collection.
#[derive(Clone)]
pub struct MongoTodoStore {
    collection: Collection<TodoDocument>,
}

impl MongoTodoStore {
    /// Connect using `config` and verify the deployment answers.
    pub async fn connect(config: &DatabaseConfig) -> ApiResult<Self> {
        let mut options = ClientOptions::parse(&config.url).await?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.max_pool_size = Some(config.max_pool_size);
        options.server_selection_timeout =
            Some(Duration::from_millis(config.server_selection_timeout_ms));

        let client = Client::with_options(options)?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(&config.name));

        database.run_command(doc! { "ping": 1 }).await?;

        tracing::info!(
            database = %database.name(),
            collection = %config.collection,
            "Connected to document store"
        );

        Ok(Self {
            collection: database.collection(&config.collection),
        })
    }

    fn by_id(id: &TodoId) -> ApiResult<Document> {
        Ok(doc! { "_id": object_id(id)? })
    }
}

#[async_trait]
impl TodoStore for MongoTodoStore {
    async fn list(&self, limit: u32) -> ApiResult<Vec<Todo>> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .limit(i64::from(limit))
            .await?;

        let documents: Vec<TodoDocument> = cursor.try_collect().await?;

        documents.into_iter().map(TodoDocument::into_todo).collect()
    }

    async fn get(&self, id: &TodoId) -> ApiResult<Todo> {
        let found = self.collection.find_one(Self::by_id(id)?).await?;

        found.ok_or_else(|| not_found(id))?.into_todo()
    }

    async fn create(&self, todo: NewTodo) -> ApiResult<Todo> {
        let now = BsonDateTime::now();
        let mut document = TodoDocument {
            id: None,
            description: todo.description,
            completed: todo.completed,
            created_at: now,
            updated_at: now,
        };

        let result = self.collection.insert_one(&document).await?;
        let inserted = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| ApiError::Database("insert did not return an ObjectId".to_string()))?;

        document.id = Some(inserted);
        document.into_todo()
    }

    async fn update(&self, id: &TodoId, patch: TodoPatch) -> ApiResult<Todo> {
        let mut set = doc! { "updatedAt": BsonDateTime::now() };
        if let Some(description) = patch.description {
            set.insert("description", description);
        }
        if let Some(completed) = patch.completed {
            set.insert("completed", completed);
        }

        let updated = self
            .collection
            .find_one_and_update(Self::by_id(id)?, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?;

        updated.ok_or_else(|| not_found(id))?.into_todo()
    }

    async fn update_completion(&self, id: &TodoId, completed: bool) -> ApiResult<Todo> {
        self.update(id, TodoPatch::completion(completed)).await
    }

    async fn delete(&self, id: &TodoId) -> ApiResult<bool> {
        let removed = self.collection.find_one_and_delete(Self::by_id(id)?).await?;

        removed.map(|_| true).ok_or_else(|| not_found(id))
    }

    fn backend(&self) -> &'static str {
        "mongo"
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. } => {
                ApiError::Unavailable(format!("Document store unreachable: {err}"))
            }
            ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
                ApiError::Timeout(format!("Document store timed out: {err}"))
            }
            ErrorKind::Io(_) => ApiError::Unavailable(format!("Document store connection lost: {err}")),
            _ => ApiError::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_into_todo() {
        let oid = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let stamp = BsonDateTime::from_millis(1_700_000_000_000);
        let document = TodoDocument {
            id: Some(oid),
            description: "buy milk".to_string(),
            completed: true,
            created_at: stamp,
            updated_at: stamp,
        };

        let todo = document.into_todo().unwrap();
        assert_eq!(todo.id.as_str(), "507f1f77bcf86cd799439011");
        assert!(todo.completed);
        assert_eq!(todo.created_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_document_without_id_is_database_error() {
        let document = TodoDocument {
            id: None,
            description: "x".to_string(),
            completed: false,
            created_at: BsonDateTime::now(),
            updated_at: BsonDateTime::now(),
        };
        assert!(matches!(document.into_todo(), Err(ApiError::Database(_))));
    }

    #[test]
    fn test_document_field_names() {
        let document = TodoDocument {
            id: None,
            description: "x".to_string(),
            completed: false,
            created_at: BsonDateTime::from_millis(0),
            updated_at: BsonDateTime::from_millis(0),
        };
        let bson = mongodb::bson::to_document(&document).unwrap();

        assert!(!bson.contains_key("_id"));
        assert!(bson.contains_key("createdAt"));
        assert!(bson.contains_key("updatedAt"));
    }

    #[test]
    fn test_object_id_filter() {
        let id = TodoId::parse("507f1f77bcf86cd799439011").unwrap();
        let filter = MongoTodoStore::by_id(&id).unwrap();
        assert_eq!(
            filter.get_object_id("_id").unwrap().to_hex(),
            "507f1f77bcf86cd799439011"
        );
    }
}
