//! Input sanitization.
//!
//! # Responsibilities
//! - Escape HTML-significant characters in every string of a JSON value
//! - Neutralize document-store query operators (`$where`, `$ne`, ...)
//! - Flag suspicious patterns for the security log
//!
//! # Design Decisions
//! - One left-to-right pass; output of the pass is a fixed point, so
//!   sanitizing twice changes nothing
//! - Existing entities (`&amp;`, `&lt;`, ...) and already-escaped operators
//!   (`\$ne`) are left alone
//! - Object keys and non-string values pass through untouched
//! - Detection never rejects a request on its own

use std::collections::HashMap;

use axum::http::HeaderMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Query operators that are escaped when they appear in text.
pub const QUERY_OPERATORS: &[&str] = &[
    "where", "ne", "gt", "gte", "lt", "lte", "in", "nin", "or", "and", "not", "nor", "exists",
    "regex", "options", "text", "slice", "elemMatch", "expr",
];

/// Entities produced by this module; an `&` already starting one is kept.
const ENTITIES: &[&str] = &["amp;", "lt;", "gt;", "quot;", "#x27;"];

static SUSPICIOUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\$where",
        r"(?i);.*return.*db",
        r"(?i)\beval\s*\(",
        r"(?i)\bselect\b.*\bfrom\b",
        r"(?i)\bunion\b.*\bselect\b",
        r"(?i)<\s*script\b",
        r"(?i)javascript:",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Sanitize a single string.
pub fn sanitize_str(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev: Option<char> = None;
    let mut rest = input;

    while let Some(c) = rest.chars().next() {
        let after = &rest[c.len_utf8()..];
        match c {
            '&' if ENTITIES.iter().any(|e| after.starts_with(e)) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '$' if prev != Some('\\') && starts_with_operator(after) => out.push_str("\\$"),
            other => out.push(other),
        }
        prev = Some(c);
        rest = after;
    }

    out
}

/// The alphanumeric run after `$` is exactly one of the operators.
fn starts_with_operator(after: &str) -> bool {
    let word_len = after
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after.len());
    QUERY_OPERATORS.contains(&&after[..word_len])
}

/// Sanitize every string nested in `value`.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_str(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, sanitize_value(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Sanitize query parameter values.
pub fn sanitize_query(params: HashMap<String, String>) -> HashMap<String, String> {
    params
        .into_iter()
        .map(|(k, v)| {
            let v = sanitize_str(&v);
            (k, v)
        })
        .collect()
}

/// Header values as sanitized strings; non-UTF-8 values are skipped.
pub fn sanitize_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), sanitize_str(v)))
        })
        .collect()
}

/// True when `input` matches any suspicious pattern.
pub fn is_suspicious(input: &str) -> bool {
    SUSPICIOUS_PATTERNS.iter().any(|re| re.is_match(input))
}

/// True when any string (key or value) nested in `value` is suspicious.
pub fn contains_suspicious(value: &Value) -> bool {
    match value {
        Value::String(s) => is_suspicious(s),
        Value::Array(items) => items.iter().any(contains_suspicious),
        Value::Object(map) => map
            .iter()
            .any(|(k, v)| is_suspicious(k) || contains_suspicious(v)),
        _ => false,
    }
}
