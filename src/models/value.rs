//! Scalar values carried by attributes and simple-content elements

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::types::Primitive;

/// A scalar with its runtime representation
///
/// The representation matters for validation: an integer satisfies integer and
/// decimal types, a decimal only decimal types, text only string types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl Value {
    pub fn primitive(&self) -> Primitive {
        match self {
            Value::Integer(_) => Primitive::Integer,
            Value::Decimal(_) => Primitive::Decimal,
            Value::Text(_) => Primitive::String,
        }
    }

    /// Whether this value is an instance of `kind`
    ///
    /// `NaN` and the infinities are outside the decimal value space.
    pub fn is_instance_of(&self, kind: Primitive) -> bool {
        match (self, kind) {
            (Value::Integer(_), Primitive::Integer | Primitive::Decimal) => true,
            (Value::Decimal(d), Primitive::Decimal) => d.is_finite(),
            (Value::Text(_), Primitive::String) => true,
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Decimal(d) => Some(*d),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Decimal(d)
    }
}
