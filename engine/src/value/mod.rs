//! Typed runtime values for variables and expression evaluation.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// A runtime value carried by execution contexts and produced by
/// expression evaluation.
///
/// `Literal` is a parse-time marker distinguishing a literal token from a
/// computed value; it carries no weight during evaluation and is stripped
/// before any comparison logic.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Number(OrderedFloat<f64>),
    String(String),
    Array(Vec<Value>),
    Map(HashMap<String, Value>),
    Literal(Box<Value>),
}

impl Value {
    pub fn literal(value: impl Into<Value>) -> Value {
        Value::Literal(Box::new(value.into()))
    }

    /// Strip any (possibly nested) literal-wrapper marker.
    pub fn unwrap_literal(self) -> Value {
        match self {
            Value::Literal(inner) => inner.unwrap_literal(),
            other => other,
        }
    }

    pub fn unwrap_literal_ref(&self) -> &Value {
        match self {
            Value::Literal(inner) => inner.unwrap_literal_ref(),
            other => other,
        }
    }

    /// Coerce to an arbitrary-precision decimal.
    ///
    /// Numeric variants always coerce; text coerces when its trimmed
    /// content parses as a number. Representation is irrelevant after
    /// coercion: integer `5` and text `"5.0"` compare equal by value.
    pub fn as_number(&self) -> Option<BigDecimal> {
        match self.unwrap_literal_ref() {
            Value::Integer(i) => Some(BigDecimal::from(*i)),
            Value::Number(n) => BigDecimal::from_str(&n.0.to_string()).ok(),
            Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
            _ => None,
        }
    }

    /// Truthiness, as used by conditional evaluation.
    pub fn as_boolean(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Number(n) => n.0 != 0.0,
            Value::String(s) => {
                let s = s.trim();
                !s.is_empty()
                    && !s.eq_ignore_ascii_case("false")
                    && !s.eq_ignore_ascii_case("off")
                    && !s.eq_ignore_ascii_case("no")
            }
            Value::Array(_) | Value::Map(_) => true,
            Value::Literal(inner) => inner.as_boolean(),
        }
    }

    /// Natural total ordering. Defined only when both operands are the
    /// same variant and that variant is intrinsically ordered.
    pub fn natural_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self.unwrap_literal_ref(), other.unwrap_literal_ref()) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Number(a), Value::Number(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.unwrap_literal_ref(), Value::Null)
    }

    /// Variant name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Literal(inner) => inner.type_name(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Number(n) => write!(f, "{}", n.0),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                let mut keys: Vec<_> = entries.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, entries[key.as_str()])?;
                }
                write!(f, "}}")
            }
            Value::Literal(inner) => write!(f, "{}", inner),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(OrderedFloat(value))
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(OrderedFloat(value as f64))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Integer(u as i64)
                } else if let Some(f) = n.as_f64() {
                    Value::Number(OrderedFloat(f))
                } else {
                    Value::Number(OrderedFloat(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}
