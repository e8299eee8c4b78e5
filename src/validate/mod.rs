//! Response validation subsystem.
//!
//! # Data Flow
//! ```text
//! raw serde_json::Value (from an upstream client)
//!     → schema.rs (structural check, one FieldError per violation)
//!     → serde deserialization into the provider's typed payload
//!     → ValidationResult<T>
//! ```
//!
//! # Design Decisions
//! - Unknown fields are ignored so upstream additions never break a feed
//! - No coercion: `"3"` is not an integer and `3.0` is not an integer
//! - Pure function, no I/O; the result is consumed immediately

pub mod schema;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

use crate::error::FeedError;

pub use schema::{kind_of, Field, Schema};

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path with `[i]` indices, `$` for the root.
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl FieldError {
    pub fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::new(path, expected, "missing")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: expected {}, got {}", self.path, self.expected, self.actual)
    }
}

/// Outcome of validating one payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult<T> {
    Valid(T),
    Invalid(Vec<FieldError>),
}

impl<T> ValidationResult<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ValidationResult<U> {
        match self {
            ValidationResult::Valid(value) => ValidationResult::Valid(f(value)),
            ValidationResult::Invalid(errors) => ValidationResult::Invalid(errors),
        }
    }

    pub fn into_result(self) -> Result<T, FeedError> {
        match self {
            ValidationResult::Valid(value) => Ok(value),
            ValidationResult::Invalid(errors) => Err(FeedError::Validation(errors)),
        }
    }
}

/// Check `raw` against `schema` and deserialize it into `T`.
pub fn validate<T: DeserializeOwned>(raw: Value, schema: &Schema) -> ValidationResult<T> {
    let mut errors = Vec::new();
    check(&raw, schema, "$", &mut errors);
    if !errors.is_empty() {
        return ValidationResult::Invalid(errors);
    }

    // Only reachable when a schema is looser than the type declared next to it.
    match serde_json::from_value(raw) {
        Ok(value) => ValidationResult::Valid(value),
        Err(e) => ValidationResult::Invalid(vec![FieldError::new(
            "$",
            "payload matching its schema",
            e.to_string(),
        )]),
    }
}

fn check(value: &Value, schema: &Schema, path: &str, errors: &mut Vec<FieldError>) {
    let mismatch = |errors: &mut Vec<FieldError>| {
        errors.push(FieldError::new(path, schema.expected(), kind_of(value)));
    };

    match schema {
        Schema::String => {
            if !value.is_string() {
                mismatch(errors);
            }
        }
        Schema::Integer => {
            if value.is_u64() && !value.is_i64() {
                errors.push(FieldError::new(path, schema.expected(), "integer out of range"));
            } else if !value.is_i64() {
                mismatch(errors);
            }
        }
        Schema::Unsigned => {
            if value.is_i64() && !value.is_u64() {
                errors.push(FieldError::new(path, schema.expected(), "negative integer"));
            } else if !value.is_u64() {
                mismatch(errors);
            }
        }
        Schema::Number => {
            if !value.is_number() {
                mismatch(errors);
            }
        }
        Schema::Boolean => {
            if !value.is_boolean() {
                mismatch(errors);
            }
        }
        Schema::OneOf(options) => match value.as_str() {
            Some(s) if options.iter().any(|option| *option == s) => {}
            Some(s) => errors.push(FieldError::new(path, schema.expected(), format!("\"{s}\""))),
            None => mismatch(errors),
        },
        Schema::Nullable(inner) => {
            if !value.is_null() {
                let first = errors.len();
                check(value, inner, path, errors);
                // Mismatches on the value itself name the nullable form;
                // errors further down keep their own expectation.
                for error in errors[first..].iter_mut().filter(|error| error.path == path) {
                    error.expected = schema.expected();
                }
            }
        }
        Schema::Array(inner) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    check(item, inner, &format!("{path}[{i}]"), errors);
                }
            }
            None => mismatch(errors),
        },
        Schema::Object(fields) => match value.as_object() {
            Some(map) => {
                for field in fields.iter() {
                    let child = child_path(path, field.name);
                    match map.get(field.name) {
                        Some(member) => check(member, &field.schema, &child, errors),
                        None if field.required => {
                            errors.push(FieldError::missing(child, field.schema.expected()));
                        }
                        None => {}
                    }
                }
            }
            None => mismatch(errors),
        },
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent == "$" {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}
