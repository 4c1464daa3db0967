//! Property value type for the Geoff notation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A property value as it can be written in Geoff and stored on a node or
/// relationship.
///
/// Arrays are homogeneous by construction: each element kind has its own
/// variant. There is no empty-array value; `[]` in the notation reads as
/// `Null` because no element type can be inferred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),

    // Homogeneous arrays
    BoolArray(Vec<bool>),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
    StringArray(Vec<String>),
}

impl Value {
    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<i32> for Value { fn from(v: i32) -> Self { Value::Int(v as i64) } }
impl From<i64> for Value { fn from(v: i64) -> Self { Value::Int(v) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::String(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::String(v.to_owned()) } }
impl From<Vec<bool>> for Value { fn from(v: Vec<bool>) -> Self { Value::BoolArray(v) } }
impl From<Vec<i64>> for Value { fn from(v: Vec<i64>) -> Self { Value::IntArray(v) } }
impl From<Vec<f64>> for Value { fn from(v: Vec<f64>) -> Self { Value::FloatArray(v) } }
impl From<Vec<String>> for Value { fn from(v: Vec<String>) -> Self { Value::StringArray(v) } }
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or(Value::Null) }
}

// ============================================================================
// Display (Geoff literal syntax)
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write_float(f, *v),
            Value::String(s) => write_string(f, s),
            Value::BoolArray(items) => write_array(f, items, |f, b| write!(f, "{b}")),
            Value::IntArray(items) => write_array(f, items, |f, i| write!(f, "{i}")),
            Value::FloatArray(items) => write_array(f, items, |f, v| write_float(f, *v)),
            Value::StringArray(items) => write_array(f, items, |f, s| write_string(f, s)),
        }
    }
}

/// Floats always carry a fractional part or exponent so they re-read as floats.
fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    let text = format!("{v:?}");
    if text.contains(['.', 'e', 'E']) {
        f.write_str(&text)
    } else {
        write!(f, "{text}.0")
    }
}

/// JSON string encoding, the inverse of the reader's unescaping.
pub(crate) fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    match serde_json::to_string(s) {
        Ok(quoted) => f.write_str(&quoted),
        Err(_) => Err(fmt::Error),
    }
}

fn write_array<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    mut item: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    write!(f, "[")?;
    for (i, v) in items.iter().enumerate() {
        if i > 0 { write!(f, ",")?; }
        item(f, v)?;
    }
    write!(f, "]")
}
