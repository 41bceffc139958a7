//! Identifier validation.
//!
//! Identifiers use the document store's native key encoding: 24 hexadecimal
//! characters. The shape is checked before any lookup reaches a store.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Length of a hex-encoded object id.
pub const ID_LENGTH: usize = 24;

/// Returns true when `raw` matches `^[0-9a-fA-F]{24}$`.
pub fn is_valid_id(raw: &str) -> bool {
    raw.len() == ID_LENGTH && raw.bytes().all(|b| b.is_ascii_hexdigit())
}

/// A structurally valid todo identifier, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TodoId(String);

impl TodoId {
    /// Validate the shape of `raw`.
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        if is_valid_id(raw) {
            Ok(Self(raw.to_ascii_lowercase()))
        } else {
            Err(ApiError::invalid_field("id", "Invalid ID format"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TodoId {
    type Error = ApiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TodoId> for String {
    fn from(id: TodoId) -> Self {
        id.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
