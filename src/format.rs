//! Formatter half of the value coercion engine.
//!
//! [`format_value`] turns one [`Value`] into the text of a table cell. The
//! dispatch order is fixed, first match wins:
//!
//! 1. [`Value::Null`] becomes the configured null token, before any handler
//!    is consulted.
//! 2. A [`Value::Named`] or [`Value::Record`] whose name has a handler in the
//!    [`HandlerRegistry`] is formatted by that handler.
//! 3. Primitives: bool tokens, strings verbatim, floats with the configured
//!    separators and precision, integers in base 10.
//! 4. Text captured from a `Display` impl.
//! 5. Bytes, decoded as UTF-8.
//! 6. Generic rendering of sequences, maps and records, formatting each
//!    element recursively.
//!
//! Unregistered newtypes are transparent: their inner value is formatted.
//!
//! ## Examples
//!
//! ```rust
//! use structtable::{format_value, FormatConfig, Value};
//!
//! let config = FormatConfig::english();
//! assert_eq!(format_value(&Value::Bool(true), &config), "YES");
//! assert_eq!(format_value(&Value::Null, &config.clone().with_null_token("N/A")), "N/A");
//! ```

use crate::error::{Error, Result};
use crate::options::FormatConfig;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Formats and scans values of one custom type.
///
/// A handler is registered under the serde name of a newtype struct (or
/// struct) and receives the serialized inner value. Implementations must be
/// thread safe since a [`FormatConfig`] may be shared by concurrent renders.
///
/// # Examples
///
/// ```rust
/// use structtable::{format_value, to_value, FormatConfig, Result, Value, ValueHandler};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Celsius(f64);
///
/// struct CelsiusHandler;
///
/// impl ValueHandler for CelsiusHandler {
///     fn format(&self, value: &Value, _config: &FormatConfig) -> String {
///         format!("{} °C", value.as_f64().unwrap_or_default())
///     }
///
///     fn scan(&self, cell: &str, config: &FormatConfig) -> Result<Value> {
///         let number = cell.trim().trim_end_matches("°C");
///         Ok(Value::Float(config.float.parse(number)?))
///     }
/// }
///
/// let config = FormatConfig::new().with_handler("Celsius", CelsiusHandler);
/// let value = to_value(&Celsius(21.5)).unwrap();
/// assert_eq!(format_value(&value, &config), "21.5 °C");
/// ```
pub trait ValueHandler: Send + Sync {
    /// Formats the inner value of the custom type.
    fn format(&self, value: &Value, config: &FormatConfig) -> String;

    /// Parses a cell into the inner value the type deserializes from.
    fn scan(&self, cell: &str, config: &FormatConfig) -> Result<Value>;

    /// Inner value used for fields that no column is bound to.
    fn zero(&self) -> Value {
        Value::Null
    }
}

/// Type identity token to handler.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Arc<dyn ValueHandler>>,
}

impl HandlerRegistry {
    /// An empty registry. [`FormatConfig::new`] starts from
    /// [`HandlerRegistry::with_builtins`] instead.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the handlers of the types in [`crate::types`].
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::types::register_builtins(&mut registry);
        registry
    }

    /// Registers `handler` for `token`, replacing a previous one.
    pub fn register<H>(&mut self, token: &'static str, handler: H)
    where
        H: ValueHandler + 'static,
    {
        self.handlers.insert(token, Arc::new(handler));
    }

    pub fn remove(&mut self, token: &str) -> bool {
        self.handlers.remove(token).is_some()
    }

    #[must_use]
    pub fn get(&self, token: &str) -> Option<&Arc<dyn ValueHandler>> {
        self.handlers.get(token)
    }

    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.handlers.contains_key(token)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tokens: Vec<_> = self.handlers.keys().collect();
        tokens.sort();
        f.debug_tuple("HandlerRegistry").field(&tokens).finish()
    }
}

/// Formats one value as cell text. Never fails.
#[must_use]
pub fn format_value(value: &Value, config: &FormatConfig) -> String {
    match value {
        Value::Null => config.null_token.clone(),
        Value::Named { name, value: inner } => match config.handlers.get(name) {
            Some(handler) => handler.format(inner, config),
            None => format_value(inner, config),
        },
        Value::Record { name, fields } => match config.handlers.get(name) {
            Some(handler) => handler.format(value, config),
            None => {
                let parts: Vec<String> = fields.values().map(|v| format_value(v, config)).collect();
                format!("{{{}}}", parts.join(" "))
            }
        },
        Value::Bool(true) => config.true_token.clone(),
        Value::Bool(false) => config.false_token.clone(),
        Value::String(s) | Value::Display(s) => s.clone(),
        Value::Float(f) => config.float.format(*f),
        Value::Int(i) => i.to_string(),
        Value::Uint(u) => u.to_string(),
        Value::BigInt(b) => b.to_string(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Seq(items) => {
            let parts: Vec<String> = items.iter().map(|v| format_value(v, config)).collect();
            format!("[{}]", parts.join(" "))
        }
        Value::Map(entries) => {
            let parts: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}:{}", format_value(k, config), format_value(v, config)))
                .collect();
            format!("map[{}]", parts.join(" "))
        }
    }
}

/// Formats a float with optional thousands grouping.
///
/// `precision == None` uses the shortest text that parses back to the same
/// float. With a precision, `pad == false` trims trailing fractional zeros.
///
/// # Examples
///
/// ```rust
/// use structtable::format::format_float;
///
/// assert_eq!(format_float(1234567.891, Some(','), '.', Some(2), true), "1,234,567.89");
/// assert_eq!(format_float(1234.5, Some('.'), ',', Some(2), true), "1.234,50");
/// assert_eq!(format_float(2.5, None, '.', Some(3), false), "2.5");
/// assert_eq!(format_float(0.1, None, '.', None, false), "0.1");
/// ```
#[must_use]
pub fn format_float(
    value: f64,
    thousands: Option<char>,
    decimal: char,
    precision: Option<usize>,
    pad: bool,
) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let mut text = match precision {
        Some(p) => format!("{:.*}", p, value),
        None => value.to_string(),
    };
    if precision.is_some() && !pad && text.contains('.') {
        let len = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(len);
    }
    // rounding can leave a negative zero
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text.remove(0);
    }

    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    let mut out = String::with_capacity(text.len() + int_part.len() / 3 + 1);
    out.push_str(sign);
    push_grouped(&mut out, int_part, thousands);
    if let Some(frac) = frac_part {
        out.push(decimal);
        out.push_str(frac);
    }
    out
}

fn push_grouped(out: &mut String, digits: &str, separator: Option<char>) {
    let Some(separator) = separator else {
        out.push_str(digits);
        return;
    };
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
}

/// Parses a float written with the given separators.
///
/// # Examples
///
/// ```rust
/// use structtable::format::parse_float;
///
/// assert_eq!(parse_float("1.234,5", Some('.'), ',').unwrap(), 1234.5);
/// assert!(parse_float("one", None, '.').is_err());
/// ```
pub fn parse_float(text: &str, thousands: Option<char>, decimal: char) -> Result<f64> {
    let trimmed = text.trim();
    let mut normalized = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if Some(c) == thousands {
            continue;
        }
        normalized.push(if c == decimal { '.' } else { c });
    }
    normalized
        .parse::<f64>()
        .map_err(|_| Error::parse("float", text))
}
