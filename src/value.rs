//! Dynamic value representation of one serialized field.
//!
//! Rendering does not inspect Rust types at runtime. Instead every record is
//! serialized through [`ValueSerializer`](crate::ser::ValueSerializer) into a
//! [`Value`] tree, and the formatter dispatches on the closed set of variants
//! below. Open extension happens through [`Value::Named`]: a serde newtype
//! struct keeps its type name so a registered handler can claim it.
//!
//! ## Examples
//!
//! ```rust
//! use structtable::{to_value, Value};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Point { x: i32, y: i32 }
//!
//! let value = to_value(&Point { x: 1, y: 2 }).unwrap();
//! let fields = value.as_record().unwrap();
//! assert_eq!(fields.get("x"), Some(&Value::Int(1)));
//! ```

use crate::map::FieldMap;
use num_bigint::BigInt;
use std::fmt;

/// One serialized field value.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    /// Absent value: `None`, unit.
    #[default]
    Null,
    Bool(bool),
    /// Signed integers up to 64 bits.
    Int(i64),
    /// Unsigned integers up to 64 bits.
    Uint(u64),
    /// 128-bit integers.
    BigInt(BigInt),
    Float(f64),
    /// Strings and chars, rendered verbatim.
    String(String),
    /// Text produced by a type's `Display` impl through `collect_str`.
    Display(String),
    /// Raw bytes from `serialize_bytes`.
    Bytes(Vec<u8>),
    Seq(Vec<Value>),
    /// Maps with arbitrary keys, in insertion order.
    Map(Vec<(Value, Value)>),
    /// A struct (or struct variant) with its serde name.
    Record {
        name: &'static str,
        fields: FieldMap,
    },
    /// A newtype struct or newtype variant wrapping `value`. The name is the
    /// identity token custom handlers are registered under.
    Named {
        name: &'static str,
        value: Box<Value>,
    },
}

impl Value {
    /// Returns true for [`Value::Null`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use structtable::Value;
    ///
    /// assert!(Value::Null.is_null());
    /// assert!(!Value::from(0).is_null());
    /// ```
    #[must_use]
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    #[inline]
    pub const fn is_record(&self) -> bool {
        matches!(self, Value::Record { .. })
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the text of `String` and `Display` values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Display(s) => Some(s),
            _ => None,
        }
    }

    /// Returns integer values that fit into `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Uint(u) => i64::try_from(*u).ok(),
            Value::BigInt(b) => i64::try_from(b).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Uint(u) => Some(*u as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_record(&self) -> Option<&FieldMap> {
        match self {
            Value::Record { fields, .. } => Some(fields),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_record_mut(&mut self) -> Option<&mut FieldMap> {
        match self {
            Value::Record { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Strips [`Value::Named`] wrappers.
    #[must_use]
    pub fn unwrap_named(&self) -> &Value {
        match self {
            Value::Named { value, .. } => value.unwrap_named(),
            other => other,
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::Uint(_) | Value::BigInt(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) | Value::Display(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Record { .. } => "record",
            Value::Named { .. } => "newtype",
        }
    }
}

/// Plain rendering without a [`FormatConfig`](crate::FormatConfig); used for
/// debugging and map keys.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Uint(u) => write!(f, "{}", u),
            Value::BigInt(b) => write!(f, "{}", b),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) | Value::Display(s) => f.write_str(s),
            Value::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Value::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("map[")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", k, v)?;
                }
                f.write_str("]")
            }
            Value::Record { fields, .. } => {
                f.write_str("{")?;
                for (i, v) in fields.values().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("}")
            }
            Value::Named { value, .. } => write!(f, "{}", value),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| crate::Error::custom(format!("expected integer, found {}", value.kind())))
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| crate::Error::custom(format!("expected float, found {}", value.kind())))
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) | Value::Display(s) => Ok(s),
            other => Err(crate::Error::custom(format!(
                "expected string, found {}",
                other.kind()
            ))),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::Uint(u64::from(u))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Uint(u)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}
