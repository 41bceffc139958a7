//! Route handlers.
//!
//! Each handler runs the same pipeline: sanitize input, validate it, call
//! the gateway, wrap the result. Rate limiting has already happened in
//! middleware; errors render themselves through `ApiError`.

use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        OriginalUri, Path, Query, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::error::{now_rfc3339, ApiError, ApiResult};
use crate::http::openapi;
use crate::http::request;
use crate::http::response::ApiResponse;
use crate::http::AppState;
use crate::todos::schema::{validate_completion, validate_create, validate_replace};
use crate::todos::Todo;

/// `GET {prefix}/todos?limit=N`
pub async fn list_todos(
    State(state): State<AppState>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> ApiResult<ApiResponse<Vec<Todo>>> {
    let params = request::query(params)?;
    let limit = request::limit(&params)?;

    let todos = state.gateway.list(limit).await?;
    Ok(ApiResponse::ok(todos))
}

/// `GET {prefix}/todos/{id}`
pub async fn get_todo(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<ApiResponse<Todo>> {
    let todo = state.gateway.get(&request::path_id(id)?).await?;
    Ok(ApiResponse::ok(todo))
}

/// `POST {prefix}/todos`
pub async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ApiResponse<Todo>> {
    let body = request::body(payload)?;
    let new_todo = validate_create(&body)?;
    state.content_policy.check(&new_todo.description)?;

    let todo = state.gateway.create(new_todo).await?;
    Ok(ApiResponse::created(todo).with_message("Todo created successfully"))
}

/// `PUT {prefix}/todos/{id}`
pub async fn replace_todo(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ApiResponse<Todo>> {
    let id = request::path_id(id)?;
    let body = request::body(payload)?;
    let patch = validate_replace(&body)?;
    if let Some(description) = &patch.description {
        state.content_policy.check(description)?;
    }

    let todo = state.gateway.update(&id, patch).await?;
    Ok(ApiResponse::ok(todo).with_message("Todo updated successfully"))
}

/// `PATCH {prefix}/todos/{id}`
pub async fn update_completion(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ApiResponse<Todo>> {
    let id = request::path_id(id)?;
    let body = request::body(payload)?;
    let completed = validate_completion(&body)?;

    let todo = state.gateway.update_completion(&id, completed).await?;
    Ok(ApiResponse::ok(todo).with_message("Completion status updated"))
}

/// `DELETE {prefix}/todos/{id}`
pub async fn delete_todo(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    state.gateway.delete(&request::path_id(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": now_rfc3339(),
        "uptime": state.started_at.elapsed().as_secs_f64(),
        "environment": state.config.server.environment.as_str(),
    }))
}

/// `GET {docs_path}/json`
pub async fn openapi_json(State(state): State<AppState>) -> Json<Value> {
    Json(openapi::document(&state.config))
}

/// Any unmatched route.
pub async fn route_not_found(method: Method, OriginalUri(uri): OriginalUri) -> Response {
    ApiError::RouteNotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
    .into_response()
}
