//! Declarative payload schemas.
//!
//! Schemas are plain `static` values so each provider can describe the shape
//! it depends on next to the client that fetches it:
//!
//! ```
//! use portfolio_feeds::validate::{Field, Schema};
//!
//! static STATS: Schema = Schema::Object(&[
//!     Field::required("pageviews", Schema::Object(&[
//!         Field::required("value", Schema::Unsigned),
//!     ])),
//! ]);
//! # let _ = &STATS;
//! ```

use serde_json::Value;

/// Expected shape of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    String,
    /// A number with no fractional part that fits `i64`.
    Integer,
    /// A non-negative integer that fits `u64`. Counts, sizes, durations.
    Unsigned,
    /// Any JSON number.
    Number,
    Boolean,
    /// A string restricted to the listed values.
    OneOf(&'static [&'static str]),
    /// `null` or the inner schema.
    Nullable(&'static Schema),
    /// Array whose every element matches the inner schema.
    Array(&'static Schema),
    /// Object with the listed fields. Extra fields are ignored.
    Object(&'static [Field]),
}

/// One named member of an object schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub schema: Schema,
    pub required: bool,
}

impl Field {
    pub const fn required(name: &'static str, schema: Schema) -> Self {
        Self {
            name,
            schema,
            required: true,
        }
    }

    /// A field that may be absent. Presence with `null` still needs `Nullable`.
    pub const fn optional(name: &'static str, schema: Schema) -> Self {
        Self {
            name,
            schema,
            required: false,
        }
    }
}

impl Schema {
    /// Human-readable description used in field errors.
    pub fn expected(&self) -> String {
        match self {
            Schema::String => "string".to_string(),
            Schema::Integer => "integer".to_string(),
            Schema::Unsigned => "unsigned integer".to_string(),
            Schema::Number => "number".to_string(),
            Schema::Boolean => "boolean".to_string(),
            Schema::OneOf(options) => format!("one of {}", options.join("|")),
            Schema::Nullable(inner) => format!("{} or null", inner.expected()),
            Schema::Array(inner) => format!("array of {}", inner.expected()),
            Schema::Object(_) => "object".to_string(),
        }
    }
}

/// Kind name of a JSON value, as reported in field errors.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
