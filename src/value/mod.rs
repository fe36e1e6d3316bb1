//! # Value Type System
//!
//! Cells exchanged with the driver: parameter values bound to placeholders and
//! column values read back from result rows.
//!
//! ## Design Decisions
//!
//! - **Driver-neutral**: `Value` only carries what a relational driver can bind
//!   natively. Timestamps stay `NaiveDateTime` so the driver binds them with its
//!   own temporal support instead of a formatted string.
//! - **Declared types**: every parameter and result column of a statement has a
//!   `SqlType`. Binding checks values against it; decoding reads columns as it.
//! - **Enumerations**: bound and decoded by wire value (see [`SqlEnum`]).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sqlrt::{params, Value};
//!
//! let bio: Option<&str> = None;
//! let values = params!["Brian Kernighan", bio];
//! assert_eq!(values, vec![Value::from("Brian Kernighan"), Value::Null]);
//! ```

mod enums;

pub use enums::SqlEnum;
#[doc(hidden)]
pub use enums::decode_enum;

use chrono::NaiveDateTime;
use std::fmt;

/// Declared type of a parameter or result column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Integer,
    Real,
    Text,
    Blob,
    Bool,
    /// Date and time without offset, bound with the driver's temporal binding
    Timestamp,
    /// Enumeration stored as its wire value; carries the enum's name
    Enum(&'static str),
}

impl SqlType {
    /// Check whether a non-null value can be bound to a slot of this type
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (SqlType::Integer, Value::Integer(_))
                | (SqlType::Real, Value::Real(_) | Value::Integer(_))
                | (SqlType::Text | SqlType::Enum(_), Value::Text(_))
                | (SqlType::Blob, Value::Blob(_))
                | (SqlType::Bool, Value::Bool(_))
                | (SqlType::Timestamp, Value::Timestamp(_))
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            SqlType::Integer => "integer",
            SqlType::Real => "real",
            SqlType::Text => "text",
            SqlType::Blob => "blob",
            SqlType::Bool => "bool",
            SqlType::Timestamp => "timestamp",
            SqlType::Enum(name) => name,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Enum(name) => write!(f, "enum {name}"),
            other => f.write_str(other.name()),
        }
    }
}

/// A single bound parameter or decoded column value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Bool(bool),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Short name of the value's kind, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            Value::Bool(_) => "bool",
            Value::Timestamp(_) => "timestamp",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Timestamp(t) => write!(f, "{t}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(b)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(t: NaiveDateTime) -> Self {
        Value::Timestamp(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Why a column value could not be converted to the requested Rust type.
///
/// Carries no position; [`crate::Row`] attaches the column index and name.
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    Type {
        expected: &'static str,
        found: &'static str,
    },
    OutOfRange {
        value: i64,
        target: &'static str,
    },
    UnknownVariant {
        enum_name: &'static str,
        value: String,
    },
}

/// Conversion from a non-null column value into a Rust type
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, Mismatch>;
}

fn type_mismatch(expected: &'static str, value: &Value) -> Mismatch {
    Mismatch::Type {
        expected,
        found: value.type_name(),
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        value.as_i64().ok_or_else(|| type_mismatch("integer", value))
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        let v = i64::from_value(value)?;
        i32::try_from(v).map_err(|_| Mismatch::OutOfRange { value: v, target: "i32" })
    }
}

impl FromValue for u32 {
    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        let v = i64::from_value(value)?;
        u32::try_from(v).map_err(|_| Mismatch::OutOfRange { value: v, target: "u32" })
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        value.as_f64().ok_or_else(|| type_mismatch("real", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| type_mismatch("text", value))
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        match value {
            Value::Blob(b) => Ok(b.clone()),
            other => Err(type_mismatch("blob", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        value.as_bool().ok_or_else(|| type_mismatch("bool", value))
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, Mismatch> {
        value
            .as_timestamp()
            .ok_or_else(|| type_mismatch("timestamp", value))
    }
}

/// Build an ordered parameter list from Rust values.
///
/// Each argument goes through `Value::from`, so `Option<T>` binds `None` as NULL
/// and enums declared with [`sql_enum!`](crate::sql_enum) bind their wire value.
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}
