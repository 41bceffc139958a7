//! OpenAPI document.

use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::todos::schema::MAX_DESCRIPTION_CHARS;
use crate::todos::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

/// OpenAPI 3.0 description of the HTTP surface.
pub fn document(config: &AppConfig) -> Value {
    let todos = format!("{}/todos", config.server.api_prefix.trim_end_matches('/'));
    let todo = format!("{todos}/{{id}}");

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "TODO API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "CRUD service for todo items"
        },
        "servers": [{ "url": format!("http://{}", config.bind_address()) }],
        "tags": [
            { "name": "TODOs", "description": "Todo management" },
            { "name": "System", "description": "Service status" }
        ],
        "paths": {
            "/health": {
                "get": {
                    "tags": ["System"],
                    "summary": "Health check",
                    "responses": { "200": { "description": "Service is up" } }
                }
            },
            todos: {
                "get": {
                    "tags": ["TODOs"],
                    "summary": "List todos",
                    "parameters": [{
                        "name": "limit",
                        "in": "query",
                        "required": false,
                        "schema": {
                            "type": "integer",
                            "minimum": 1,
                            "maximum": MAX_LIST_LIMIT,
                            "default": DEFAULT_LIST_LIMIT
                        }
                    }],
                    "responses": {
                        "200": envelope("Todos", json!({ "type": "array", "items": { "$ref": "#/components/schemas/Todo" } })),
                        "400": error_ref("Invalid limit")
                    }
                },
                "post": {
                    "tags": ["TODOs"],
                    "summary": "Create a todo",
                    "requestBody": body_ref("CreateTodo"),
                    "responses": {
                        "201": envelope("Created", todo_ref()),
                        "400": error_ref("Invalid body"),
                        "422": error_ref("Content not allowed")
                    }
                }
            },
            todo: {
                "parameters": [{
                    "name": "id",
                    "in": "path",
                    "required": true,
                    "schema": { "type": "string", "pattern": "^[0-9a-fA-F]{24}$" }
                }],
                "get": {
                    "tags": ["TODOs"],
                    "summary": "Get a todo",
                    "responses": {
                        "200": envelope("Todo", todo_ref()),
                        "400": error_ref("Invalid ID format"),
                        "404": error_ref("Not found")
                    }
                },
                "put": {
                    "tags": ["TODOs"],
                    "summary": "Replace a todo",
                    "requestBody": body_ref("ReplaceTodo"),
                    "responses": {
                        "200": envelope("Updated", todo_ref()),
                        "400": error_ref("Invalid ID or body"),
                        "404": error_ref("Not found")
                    }
                },
                "patch": {
                    "tags": ["TODOs"],
                    "summary": "Update completion status",
                    "requestBody": body_ref("CompletionUpdate"),
                    "responses": {
                        "200": envelope("Updated", todo_ref()),
                        "400": error_ref("Invalid ID or body"),
                        "404": error_ref("Not found")
                    }
                },
                "delete": {
                    "tags": ["TODOs"],
                    "summary": "Delete a todo",
                    "responses": {
                        "204": { "description": "Deleted" },
                        "400": error_ref("Invalid ID format"),
                        "404": error_ref("Not found")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Todo": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "description": { "type": "string" },
                        "completed": { "type": "boolean" },
                        "createdAt": { "type": "string", "format": "date-time" },
                        "updatedAt": { "type": "string", "format": "date-time" }
                    }
                },
                "CreateTodo": {
                    "type": "object",
                    "required": ["description"],
                    "additionalProperties": false,
                    "properties": {
                        "description": description_schema(),
                        "completed": { "type": "boolean", "default": false }
                    }
                },
                "ReplaceTodo": {
                    "type": "object",
                    "required": ["description", "completed"],
                    "additionalProperties": false,
                    "properties": {
                        "description": description_schema(),
                        "completed": { "type": "boolean" }
                    }
                },
                "CompletionUpdate": {
                    "type": "object",
                    "required": ["completed"],
                    "additionalProperties": false,
                    "properties": { "completed": { "type": "boolean" } }
                },
                "Error": {
                    "type": "object",
                    "properties": {
                        "success": { "type": "boolean" },
                        "error": {
                            "type": "object",
                            "properties": {
                                "name": { "type": "string" },
                                "message": { "type": "string" },
                                "code": { "type": "string" },
                                "details": { "type": "object" }
                            }
                        },
                        "timestamp": { "type": "string", "format": "date-time" }
                    }
                }
            }
        }
    })
}

fn description_schema() -> Value {
    json!({ "type": "string", "minLength": 1, "maxLength": MAX_DESCRIPTION_CHARS })
}

fn todo_ref() -> Value {
    json!({ "$ref": "#/components/schemas/Todo" })
}

fn body_ref(schema: &str) -> Value {
    json!({
        "required": true,
        "content": {
            "application/json": { "schema": { "$ref": format!("#/components/schemas/{schema}") } }
        }
    })
}

fn error_ref(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": { "$ref": "#/components/schemas/Error" } }
        }
    })
}

fn envelope(description: &str, data: Value) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": {
                    "type": "object",
                    "properties": {
                        "success": { "type": "boolean" },
                        "data": data,
                        "message": { "type": "string" },
                        "timestamp": { "type": "string", "format": "date-time" }
                    }
                }
            }
        }
    })
}
