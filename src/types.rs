use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::D1Error;

/// Scalar values that can be bound as parameters or read back from a result row.
///
/// The variant is the source of truth for the type: a byte sequence is always `Blob`, never an
/// array of integers, even after a JSON round trip:
/// ```rust
/// use d1_middleware::prelude::*;
///
/// let params = vec![
///     D1Value::from(4),
///     D1Value::from("yellow"),
///     D1Value::from(vec![0xff_u8, 0xff, 0x00]),
/// ];
/// let json = serde_json::to_string(&params).unwrap();
/// let back: Vec<D1Value> = serde_json::from_str(&json).unwrap();
/// assert_eq!(params, back);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum D1Value {
    /// NULL value
    Null,
    /// Integer value (64-bit)
    Integer(i64),
    /// Floating point value (64-bit)
    Real(f64),
    /// Text/string value
    Text(String),
    /// Binary data
    Blob(Vec<u8>),
}

impl D1Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        if let D1Value::Integer(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            D1Value::Real(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            D1Value::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let D1Value::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let D1Value::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Name used in type errors, matching the JavaScript `typeof` vocabulary callers expect.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            D1Value::Null => "null",
            D1Value::Integer(_) | D1Value::Real(_) => "number",
            D1Value::Text(_) => "string",
            D1Value::Blob(_) => "ArrayBuffer",
        }
    }
}

impl From<i64> for D1Value {
    fn from(value: i64) -> Self {
        D1Value::Integer(value)
    }
}

impl From<i32> for D1Value {
    fn from(value: i32) -> Self {
        D1Value::Integer(i64::from(value))
    }
}

impl From<u32> for D1Value {
    fn from(value: u32) -> Self {
        D1Value::Integer(i64::from(value))
    }
}

impl From<f64> for D1Value {
    fn from(value: f64) -> Self {
        D1Value::Real(value)
    }
}

impl From<bool> for D1Value {
    fn from(value: bool) -> Self {
        D1Value::Integer(i64::from(value))
    }
}

impl From<&str> for D1Value {
    fn from(value: &str) -> Self {
        D1Value::Text(value.to_owned())
    }
}

impl From<String> for D1Value {
    fn from(value: String) -> Self {
        D1Value::Text(value)
    }
}

impl From<Vec<u8>> for D1Value {
    fn from(value: Vec<u8>) -> Self {
        D1Value::Blob(value)
    }
}

impl From<&[u8]> for D1Value {
    fn from(value: &[u8]) -> Self {
        D1Value::Blob(value.to_vec())
    }
}

impl<T: Into<D1Value>> From<Option<T>> for D1Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(D1Value::Null, Into::into)
    }
}

impl TryFrom<&JsonValue> for D1Value {
    type Error = D1Error;

    /// Convert an untyped JSON value without coercion.
    ///
    /// Arrays are accepted only when every element is an integer in `0..=255`, in which case they
    /// bind as a byte sequence.
    fn try_from(value: &JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Null => Ok(D1Value::Null),
            JsonValue::Bool(b) => Ok(D1Value::from(*b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(D1Value::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(D1Value::Real(f))
                } else {
                    Err(unsupported("number", value))
                }
            }
            JsonValue::String(s) => Ok(D1Value::Text(s.clone())),
            JsonValue::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|byte| u8::try_from(byte).ok())
                        .ok_or_else(|| unsupported("object", value))
                })
                .collect::<Result<Vec<u8>, D1Error>>()
                .map(D1Value::Blob),
            JsonValue::Object(_) => Err(unsupported("object", value)),
        }
    }
}

fn unsupported(kind: &str, value: &JsonValue) -> D1Error {
    D1Error::binding(format!("Type '{kind}' not supported for value '{value}'"))
}

impl rusqlite::ToSql for D1Value {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, ValueRef};

        Ok(match self {
            D1Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            D1Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            D1Value::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            D1Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            D1Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl From<rusqlite::types::Value> for D1Value {
    fn from(value: rusqlite::types::Value) -> Self {
        use rusqlite::types::Value;

        match value {
            Value::Null => D1Value::Null,
            Value::Integer(i) => D1Value::Integer(i),
            Value::Real(f) => D1Value::Real(f),
            Value::Text(s) => D1Value::Text(s),
            Value::Blob(b) => D1Value::Blob(b),
        }
    }
}

/// How a single-statement call (`run`, `all`, `raw`, `first`) treats SQL text that splits into
/// more than one statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum MultiStatementPolicy {
    /// Always reject multi-statement text.
    Strict,
    /// Reject, unless only the final statement carries placeholders; that statement alone then
    /// runs and the earlier ones are skipped.
    #[default]
    FinalStatementWithParams,
    /// Run only the final statement regardless of placeholders.
    ExecuteLast,
}
