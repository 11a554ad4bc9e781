//! Formatting configuration shared by the formatter and the scanner.
//!
//! A [`FormatConfig`] is a plain value: build it once, then hand it to a
//! [`TableRenderer`](crate::TableRenderer) or [`TableReader`](crate::TableReader).
//! It is `Send + Sync` and never mutated by the engine, so one config can
//! serve many renders at the same time.
//!
//! ## Presets
//!
//! | Preset | Decimal | Money | Date | true / false |
//! |---|---|---|---|---|
//! | [`FormatConfig::new`] | `1234.5` | `1,234.50` | `2024-01-31` | `true` / `false` |
//! | [`FormatConfig::english`] | `1234.5` | `1,234.50` | `2024-01-31` | `YES` / `NO` |
//! | [`FormatConfig::german`] | `1234,5` | `1.234,50` | `31.01.2024` | `JA` / `NEIN` |
//!
//! ## Examples
//!
//! ```rust
//! use structtable::{format_value, FormatConfig, Value};
//!
//! let config = FormatConfig::new()
//!     .with_float_precision(Some(2))
//!     .with_thousands_separator(Some(','));
//! assert_eq!(format_value(&Value::Float(12345.678), &config), "12,345.68");
//! ```

use crate::error::Result;
use crate::format::{format_float, parse_float, HandlerRegistry, ValueHandler};

/// `chrono` layout of ISO 8601 dates.
pub const ISO_DATE_LAYOUT: &str = "%Y-%m-%d";

/// `chrono` layout of RFC 3339 timestamps.
pub const RFC3339_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Float rendering rules.
///
/// # Examples
///
/// ```rust
/// use structtable::FloatFormat;
///
/// let german = FloatFormat::german();
/// assert_eq!(german.format(0.25), "0,25");
/// assert_eq!(german.parse("0,25").unwrap(), 0.25);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FloatFormat {
    pub thousands_separator: Option<char>,
    pub decimal_separator: char,
    /// Digits after the decimal separator, `None` for the natural shortest form.
    pub precision: Option<usize>,
    /// Keep trailing zeros up to `precision`.
    pub pad_precision: bool,
}

impl Default for FloatFormat {
    fn default() -> Self {
        FloatFormat {
            thousands_separator: None,
            decimal_separator: '.',
            precision: None,
            pad_precision: false,
        }
    }
}

impl FloatFormat {
    #[must_use]
    pub fn english() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn german() -> Self {
        FloatFormat {
            decimal_separator: ',',
            ..Self::default()
        }
    }

    #[must_use]
    pub fn format(&self, value: f64) -> String {
        format_float(
            value,
            self.thousands_separator,
            self.decimal_separator,
            self.precision,
            self.pad_precision,
        )
    }

    pub fn parse(&self, text: &str) -> Result<f64> {
        parse_float(text, self.thousands_separator, self.decimal_separator)
    }
}

/// Rendering rules for money amounts and currency placement.
#[derive(Clone, Debug, PartialEq)]
pub struct MoneyFormat {
    /// Write `EUR 1.00` instead of `1.00 EUR`.
    pub currency_first: bool,
    pub thousands_separator: Option<char>,
    pub decimal_separator: char,
    pub precision: usize,
}

impl Default for MoneyFormat {
    fn default() -> Self {
        MoneyFormat {
            currency_first: true,
            thousands_separator: Some(','),
            decimal_separator: '.',
            precision: 2,
        }
    }
}

impl MoneyFormat {
    #[must_use]
    pub fn english() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn german() -> Self {
        MoneyFormat {
            currency_first: true,
            thousands_separator: Some('.'),
            decimal_separator: ',',
            precision: 2,
        }
    }

    /// Formats an amount, always padded to `precision`.
    #[must_use]
    pub fn format(&self, amount: f64) -> String {
        format_float(
            amount,
            self.thousands_separator,
            self.decimal_separator,
            Some(self.precision),
            true,
        )
    }

    pub fn parse(&self, text: &str) -> Result<f64> {
        parse_float(text, self.thousands_separator, self.decimal_separator)
    }
}

/// Configuration of the value coercion engine.
///
/// # Examples
///
/// ```rust
/// use structtable::FormatConfig;
///
/// let config = FormatConfig::german();
/// assert_eq!(config.true_token, "JA");
/// assert_eq!(config.float.decimal_separator, ',');
/// assert_eq!(config.date_layout, "%d.%m.%Y");
/// ```
#[derive(Clone, Debug)]
pub struct FormatConfig {
    pub float: FloatFormat,
    pub money: MoneyFormat,
    pub null_token: String,
    pub true_token: String,
    pub false_token: String,
    /// `chrono` strftime layout of [`Date`](crate::types::Date) cells.
    pub date_layout: String,
    /// `chrono` strftime layout of [`DateTime`](crate::types::DateTime) cells.
    pub time_layout: String,
    pub handlers: HandlerRegistry,
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            float: FloatFormat::default(),
            money: MoneyFormat::default(),
            null_token: String::new(),
            true_token: "true".to_string(),
            false_token: "false".to_string(),
            date_layout: ISO_DATE_LAYOUT.to_string(),
            time_layout: RFC3339_LAYOUT.to_string(),
            handlers: HandlerRegistry::with_builtins(),
        }
    }
}

impl FormatConfig {
    /// Neutral configuration: `.` decimal separator, natural float precision,
    /// empty null token, `true`/`false`, ISO dates and RFC 3339 timestamps.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// English report style with `YES`/`NO` booleans.
    #[must_use]
    pub fn english() -> Self {
        FormatConfig {
            float: FloatFormat::english(),
            money: MoneyFormat::english(),
            true_token: "YES".to_string(),
            false_token: "NO".to_string(),
            ..Self::default()
        }
    }

    /// German report style: `,` decimal separator, `31.01.2024` dates and
    /// `JA`/`NEIN` booleans. Timestamps use `31.01.2024 13:45:00` (UTC)
    /// instead of RFC 3339; set [`FormatConfig::with_time_layout`] with
    /// [`RFC3339_LAYOUT`] to keep the neutral form.
    #[must_use]
    pub fn german() -> Self {
        FormatConfig {
            float: FloatFormat::german(),
            money: MoneyFormat::german(),
            true_token: "JA".to_string(),
            false_token: "NEIN".to_string(),
            date_layout: "%d.%m.%Y".to_string(),
            time_layout: "%d.%m.%Y %H:%M:%S".to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_float(mut self, float: FloatFormat) -> Self {
        self.float = float;
        self
    }

    #[must_use]
    pub fn with_money(mut self, money: MoneyFormat) -> Self {
        self.money = money;
        self
    }

    #[must_use]
    pub fn with_thousands_separator(mut self, separator: Option<char>) -> Self {
        self.float.thousands_separator = separator;
        self
    }

    #[must_use]
    pub fn with_decimal_separator(mut self, separator: char) -> Self {
        self.float.decimal_separator = separator;
        self
    }

    #[must_use]
    pub fn with_float_precision(mut self, precision: Option<usize>) -> Self {
        self.float.precision = precision;
        self
    }

    #[must_use]
    pub fn with_pad_precision(mut self, pad: bool) -> Self {
        self.float.pad_precision = pad;
        self
    }

    #[must_use]
    pub fn with_null_token(mut self, token: impl Into<String>) -> Self {
        self.null_token = token.into();
        self
    }

    #[must_use]
    pub fn with_bool_tokens(mut self, true_token: impl Into<String>, false_token: impl Into<String>) -> Self {
        self.true_token = true_token.into();
        self.false_token = false_token.into();
        self
    }

    #[must_use]
    pub fn with_date_layout(mut self, layout: impl Into<String>) -> Self {
        self.date_layout = layout.into();
        self
    }

    #[must_use]
    pub fn with_time_layout(mut self, layout: impl Into<String>) -> Self {
        self.time_layout = layout.into();
        self
    }

    /// Registers a handler for the newtype (or struct) named `token`.
    #[must_use]
    pub fn with_handler<H>(mut self, token: &'static str, handler: H) -> Self
    where
        H: ValueHandler + 'static,
    {
        self.handlers.register(token, handler);
        self
    }

    /// Removes the handler for `token`, making that type transparent.
    #[must_use]
    pub fn without_handler(mut self, token: &str) -> Self {
        self.handlers.remove(token);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DATE_TOKEN;

    #[test]
    fn test_presets() {
        let config = FormatConfig::new();
        assert_eq!(config.null_token, "");
        assert_eq!(config.true_token, "true");
        assert!(config.handlers.contains(DATE_TOKEN));

        let english = FormatConfig::english();
        assert_eq!((english.true_token.as_str(), english.false_token.as_str()), ("YES", "NO"));

        let german = FormatConfig::german();
        assert_eq!(german.money.format(1234.5), "1.234,50");
        assert!(german.money.currency_first);
        assert_eq!(german.time_layout, "%d.%m.%Y %H:%M:%S");
    }

    #[test]
    fn test_builders_chain() {
        let config = FormatConfig::new()
            .with_decimal_separator(',')
            .with_float_precision(Some(3))
            .with_pad_precision(true)
            .with_bool_tokens("Y", "N")
            .without_handler(DATE_TOKEN);
        assert_eq!(config.float.format(1.5), "1,500");
        assert_eq!(config.true_token, "Y");
        assert!(!config.handlers.contains(DATE_TOKEN));
    }

    #[test]
    fn test_config_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FormatConfig>();
    }
}
