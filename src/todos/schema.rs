//! Payload validation for create, full-update and completion-update bodies.
//!
//! # Responsibilities
//! - Check shape, types and lengths of already-sanitized JSON bodies
//! - Reject unknown fields
//! - Produce typed DTOs for the gateway
//!
//! # Design Decisions
//! - Every violation is collected, the client sees all of them at once
//! - `description` is trimmed before the length check
//! - Create defaults `completed` to false; full update requires both fields

use serde_json::{Map, Value};

use crate::error::{ApiError, FieldViolation};
use crate::security::sanitize::sanitize_str;
use crate::todos::types::{NewTodo, TodoPatch};

/// Maximum description length in characters, after trimming.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

const TODO_FIELDS: &[&str] = &["description", "completed"];
const COMPLETION_FIELDS: &[&str] = &["completed"];

/// Validate a create payload.
pub fn validate_create(body: &Value) -> Result<NewTodo, ApiError> {
    let mut violations = Vec::new();
    let fields = object(body, TODO_FIELDS, &mut violations)?;

    let description = required_description(fields, &mut violations);
    let completed = match fields.get("completed") {
        None => Some(false),
        Some(value) => boolean("completed", value, &mut violations),
    };

    match (description, completed) {
        (Some(description), Some(completed)) if violations.is_empty() => Ok(NewTodo {
            description,
            completed,
        }),
        _ => Err(rejected(violations)),
    }
}

/// Validate a full-update payload. Both fields are required.
pub fn validate_replace(body: &Value) -> Result<TodoPatch, ApiError> {
    let mut violations = Vec::new();
    let fields = object(body, TODO_FIELDS, &mut violations)?;

    let description = required_description(fields, &mut violations);
    let completed = required_completed(fields, &mut violations);

    match (description, completed) {
        (Some(description), Some(completed)) if violations.is_empty() => {
            Ok(NewTodo {
                description,
                completed,
            }
            .into())
        }
        _ => Err(rejected(violations)),
    }
}

/// Validate a completion-only payload.
pub fn validate_completion(body: &Value) -> Result<bool, ApiError> {
    let mut violations = Vec::new();
    let fields = object(body, COMPLETION_FIELDS, &mut violations)?;

    match required_completed(fields, &mut violations) {
        Some(completed) if violations.is_empty() => Ok(completed),
        _ => Err(rejected(violations)),
    }
}

/// Case-insensitive blocklist applied to sanitized descriptions.
///
/// Terms are escaped the same way as request input so markup in a term
/// still matches.
#[derive(Debug, Clone, Default)]
pub struct ContentPolicy {
    blocked_terms: Vec<String>,
}

impl ContentPolicy {
    pub fn new(blocked_terms: &[String]) -> Self {
        Self {
            blocked_terms: blocked_terms
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(|t| sanitize_str(&t.to_lowercase()))
                .collect(),
        }
    }

    /// Fails with a 422 client error when `description` contains a blocked term.
    pub fn check(&self, description: &str) -> Result<(), ApiError> {
        if self.blocked_terms.is_empty() {
            return Ok(());
        }

        let lowered = description.to_lowercase();
        if self.blocked_terms.iter().any(|term| lowered.contains(term)) {
            return Err(ApiError::client("Content not allowed"));
        }
        Ok(())
    }
}

fn object<'a>(
    body: &'a Value,
    allowed: &[&str],
    violations: &mut Vec<FieldViolation>,
) -> Result<&'a Map<String, Value>, ApiError> {
    let Some(fields) = body.as_object() else {
        return Err(ApiError::invalid_field("body", "Body must be a JSON object"));
    };

    for key in fields.keys() {
        if !allowed.contains(&key.as_str()) {
            violations.push(FieldViolation::new(key.clone(), "Unknown field"));
        }
    }
    Ok(fields)
}

fn required_description(
    fields: &Map<String, Value>,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    let Some(value) = fields.get("description") else {
        violations.push(FieldViolation::new("description", "Description is required"));
        return None;
    };

    let Some(text) = value.as_str() else {
        violations.push(FieldViolation::new("description", "Description must be a string"));
        return None;
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        violations.push(FieldViolation::new("description", "Description cannot be empty"));
        return None;
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_CHARS {
        violations.push(FieldViolation::new(
            "description",
            format!("Description too long (max {MAX_DESCRIPTION_CHARS} characters)"),
        ));
        return None;
    }

    Some(trimmed.to_string())
}

fn required_completed(
    fields: &Map<String, Value>,
    violations: &mut Vec<FieldViolation>,
) -> Option<bool> {
    match fields.get("completed") {
        Some(value) => boolean("completed", value, violations),
        None => {
            violations.push(FieldViolation::new("completed", "Completed is required"));
            None
        }
    }
}

fn boolean(field: &str, value: &Value, violations: &mut Vec<FieldViolation>) -> Option<bool> {
    let parsed = value.as_bool();
    if parsed.is_none() {
        violations.push(FieldViolation::new(field, "Completed must be a boolean"));
    }
    parsed
}

fn rejected(details: Vec<FieldViolation>) -> ApiError {
    ApiError::Validation {
        message: "Validation failed".to_string(),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields_of(err: ApiError) -> Vec<String> {
        match err {
            ApiError::Validation { details, .. } => details.into_iter().map(|d| d.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_trims_description() {
        let todo = validate_create(&json!({"description": "  buy milk  ", "completed": false}))
            .unwrap();
        assert_eq!(todo.description, "buy milk");
        assert!(!todo.completed);
    }

    #[test]
    fn test_create_defaults_completed() {
        let todo = validate_create(&json!({"description": "walk"})).unwrap();
        assert!(!todo.completed);
    }

    #[test]
    fn test_create_rejects_empty_and_whitespace() {
        assert_eq!(
            fields_of(validate_create(&json!({"description": "", "completed": false})).unwrap_err()),
            vec!["description"]
        );
        assert!(validate_create(&json!({"description": "   "})).is_err());
    }

    #[test]
    fn test_create_length_limit_after_trim() {
        let exact = "a".repeat(MAX_DESCRIPTION_CHARS);
        assert!(validate_create(&json!({"description": format!("  {exact}  ")})).is_ok());

        let over = "a".repeat(MAX_DESCRIPTION_CHARS + 1);
        assert!(validate_create(&json!({"description": over})).is_err());
    }

    #[test]
    fn test_create_collects_all_violations() {
        let err = validate_create(&json!({
            "description": 42,
            "completed": "yes",
            "owner": "mallory"
        }))
        .unwrap_err();

        let mut fields = fields_of(err);
        fields.sort();
        assert_eq!(fields, vec!["completed", "description", "owner"]);
    }

    #[test]
    fn test_non_object_body() {
        assert_eq!(fields_of(validate_create(&json!(["x"])).unwrap_err()), vec!["body"]);
        assert!(validate_completion(&json!(null)).is_err());
    }

    #[test]
    fn test_replace_requires_both_fields() {
        assert_eq!(
            fields_of(validate_replace(&json!({"completed": true})).unwrap_err()),
            vec!["description"]
        );
        assert_eq!(
            fields_of(validate_replace(&json!({"description": "x"})).unwrap_err()),
            vec!["completed"]
        );

        let patch = validate_replace(&json!({"description": " x ", "completed": true})).unwrap();
        assert_eq!(patch.description.as_deref(), Some("x"));
        assert_eq!(patch.completed, Some(true));
    }

    #[test]
    fn test_completion_payload() {
        assert!(validate_completion(&json!({"completed": true})).unwrap());
        assert_eq!(
            fields_of(validate_completion(&json!({})).unwrap_err()),
            vec!["completed"]
        );
        assert_eq!(
            fields_of(validate_completion(&json!({"completed": true, "description": "x"})).unwrap_err()),
            vec!["description"]
        );
    }

    #[test]
    fn test_content_policy() {
        let policy = ContentPolicy::new(&["Spam".to_string(), " ".to_string()]);
        assert!(policy.check("buy milk").is_ok());

        let err = policy.check("totally not SPAM").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);

        let markup = ContentPolicy::new(&["<Script>".to_string(), "rock & roll".to_string()]);
        assert!(markup.check(&sanitize_str("a <script> tag")).is_err());
        assert!(markup.check(&sanitize_str("Rock & Roll")).is_err());
        assert!(markup.check("script").is_ok());

        assert!(ContentPolicy::default().check("spam").is_ok());
    }
}
