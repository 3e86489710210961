//! Cell models before and after missing-value normalization.
//!
//! Parsers produce [`Cell`]s, which can still carry format-specific notions of
//! "missing" (blank spreadsheet cells, error cells, NaN floats, sentinel text).
//! [`crate::normalize`] turns them into [`Value`]s, where the only
//! representation of a missing value is [`Value::Null`].

use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Spreadsheet error cell such as `#N/A` or `#DIV/0!`.
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    /// Never NaN.
    Float(f64),
    Boolean(bool),
}

impl Value {
    pub fn as_display(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            // `f64`'s Display already omits the fraction of whole numbers.
            Value::Float(f) => Some(f.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_display() {
            Some(text) => write!(f, "{text}"),
            None => write!(f, "null"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}
