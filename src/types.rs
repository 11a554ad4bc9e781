//! Domain value types with their own formatting and parsing.
//!
//! Dates, durations and money amounts have no faithful primitive cell
//! representation, so each of them serializes as a serde newtype struct whose
//! name is a `*_TOKEN` constant. [`FormatConfig::new`](crate::FormatConfig::new)
//! registers a [`ValueHandler`] for every token.
//!
//! Outside of tables the wrappers serialize as their canonical inner value
//! (ISO date string, RFC 3339 string, milliseconds, float), so they work with
//! any other serde format as well.
//!
//! ## Examples
//!
//! ```rust
//! use structtable::types::{Amount, Date};
//! use structtable::{format_value, to_value, FormatConfig};
//!
//! let date = Date::from_ymd(2024, 1, 31).unwrap();
//! let german = FormatConfig::german();
//! assert_eq!(format_value(&to_value(&date).unwrap(), &german), "31.01.2024");
//! assert_eq!(format_value(&to_value(&Amount(1234.5)).unwrap(), &german), "1.234,50");
//! ```

use crate::error::{Error, Result};
use crate::format::{format_value, HandlerRegistry, ValueHandler};
use crate::options::{FormatConfig, ISO_DATE_LAYOUT};
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

pub const DATE_TOKEN: &str = "$structtable::Date";
pub const DATE_TIME_TOKEN: &str = "$structtable::DateTime";
pub const DURATION_TOKEN: &str = "$structtable::Duration";
pub const AMOUNT_TOKEN: &str = "$structtable::Amount";
pub const CURRENCY_AMOUNT_TOKEN: &str = "$structtable::CurrencyAmount";

pub(crate) fn register_builtins(registry: &mut HandlerRegistry) {
    registry.register(DATE_TOKEN, DateHandler);
    registry.register(DATE_TIME_TOKEN, DateTimeHandler);
    registry.register(DURATION_TOKEN, DurationHandler);
    registry.register(AMOUNT_TOKEN, AmountHandler);
    registry.register(CURRENCY_AMOUNT_TOKEN, CurrencyAmountHandler);
}

/// Renders with a user supplied layout, `None` if the layout is invalid.
fn format_with_layout(item: impl fmt::Display) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", item).ok()?;
    Some(out)
}

/// Calendar date, formatted with [`FormatConfig::date_layout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(pub NaiveDate);

impl Date {
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Date)
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let iso = self.0.format(ISO_DATE_LAYOUT).to_string();
        serializer.serialize_newtype_struct(DATE_TOKEN, &iso)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct DateVisitor;

        impl<'de> Visitor<'de> for DateVisitor {
            type Value = Date;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an ISO 8601 date")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Date, E> {
                NaiveDate::parse_from_str(v, ISO_DATE_LAYOUT)
                    .map(Date)
                    .map_err(E::custom)
            }

            fn visit_newtype_struct<D: Deserializer<'de>>(
                self,
                deserializer: D,
            ) -> std::result::Result<Date, D::Error> {
                deserializer.deserialize_str(self)
            }
        }

        deserializer.deserialize_newtype_struct(DATE_TOKEN, DateVisitor)
    }
}

struct DateHandler;

impl ValueHandler for DateHandler {
    fn format(&self, value: &Value, config: &FormatConfig) -> String {
        let date = value
            .as_str()
            .and_then(|iso| NaiveDate::parse_from_str(iso, ISO_DATE_LAYOUT).ok());
        match date {
            Some(date) => format_with_layout(date.format(&config.date_layout))
                .unwrap_or_else(|| date.format(ISO_DATE_LAYOUT).to_string()),
            None => format_value(value, config),
        }
    }

    fn scan(&self, cell: &str, config: &FormatConfig) -> Result<Value> {
        let text = cell.trim();
        let date = NaiveDate::parse_from_str(text, &config.date_layout)
            .or_else(|_| NaiveDate::parse_from_str(text, ISO_DATE_LAYOUT))
            .map_err(|_| Error::parse("date", cell))?;
        Ok(Value::String(date.format(ISO_DATE_LAYOUT).to_string()))
    }

    fn zero(&self) -> Value {
        Value::from("1970-01-01")
    }
}

/// UTC timestamp, formatted with [`FormatConfig::time_layout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime(pub chrono::DateTime<Utc>);

impl From<chrono::DateTime<Utc>> for DateTime {
    fn from(time: chrono::DateTime<Utc>) -> Self {
        DateTime(time)
    }
}

impl Serialize for DateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(DATE_TIME_TOKEN, &self.0.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct DateTimeVisitor;

        impl<'de> Visitor<'de> for DateTimeVisitor {
            type Value = DateTime;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an RFC 3339 timestamp")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<DateTime, E> {
                chrono::DateTime::parse_from_rfc3339(v)
                    .map(|t| DateTime(t.with_timezone(&Utc)))
                    .map_err(E::custom)
            }

            fn visit_newtype_struct<D: Deserializer<'de>>(
                self,
                deserializer: D,
            ) -> std::result::Result<DateTime, D::Error> {
                deserializer.deserialize_str(self)
            }
        }

        deserializer.deserialize_newtype_struct(DATE_TIME_TOKEN, DateTimeVisitor)
    }
}

struct DateTimeHandler;

impl ValueHandler for DateTimeHandler {
    fn format(&self, value: &Value, config: &FormatConfig) -> String {
        let time = value
            .as_str()
            .and_then(|text| chrono::DateTime::parse_from_rfc3339(text).ok());
        match time {
            Some(time) => format_with_layout(time.format(&config.time_layout))
                .unwrap_or_else(|| time.to_rfc3339()),
            None => format_value(value, config),
        }
    }

    fn scan(&self, cell: &str, config: &FormatConfig) -> Result<Value> {
        let text = cell.trim();
        let time = chrono::DateTime::parse_from_str(text, &config.time_layout)
            .map(|t| t.with_timezone(&Utc))
            .or_else(|_| chrono::DateTime::parse_from_rfc3339(text).map(|t| t.with_timezone(&Utc)))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(text, &config.time_layout)
                    .map(|naive| Utc.from_utc_datetime(&naive))
            })
            .map_err(|_| Error::parse("timestamp", cell))?;
        Ok(Value::String(time.to_rfc3339()))
    }

    fn zero(&self) -> Value {
        Value::from("1970-01-01T00:00:00+00:00")
    }
}

/// Elapsed time, formatted as `h:mm:ss` with optional `.mmm` milliseconds.
///
/// Hours are not wrapped at 24, matching the `[h]:mm:ss` spreadsheet format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(pub chrono::Duration);

impl From<chrono::Duration> for Duration {
    fn from(duration: chrono::Duration) -> Self {
        Duration(duration)
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(DURATION_TOKEN, &self.0.num_milliseconds())
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct DurationVisitor;

        impl<'de> Visitor<'de> for DurationVisitor {
            type Value = Duration;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a duration in milliseconds")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Duration, E> {
                if v == i64::MIN {
                    return Err(E::custom("duration out of range"));
                }
                Ok(Duration(chrono::Duration::milliseconds(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Duration, E> {
                let ms = i64::try_from(v).map_err(|_| E::custom("duration out of range"))?;
                self.visit_i64(ms)
            }

            fn visit_newtype_struct<D: Deserializer<'de>>(
                self,
                deserializer: D,
            ) -> std::result::Result<Duration, D::Error> {
                deserializer.deserialize_i64(self)
            }
        }

        deserializer.deserialize_newtype_struct(DURATION_TOKEN, DurationVisitor)
    }
}

fn format_duration(ms: i64) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let abs = ms.unsigned_abs();
    let (secs, millis) = (abs / 1000, abs % 1000);
    let (hours, minutes, seconds) = (secs / 3600, secs / 60 % 60, secs % 60);
    if millis == 0 {
        format!("{sign}{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{sign}{hours}:{minutes:02}:{seconds:02}.{millis:03}")
    }
}

fn parse_duration(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let mut parts = text.split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds_part = parts.next()?;
    if parts.next().is_some() || minutes >= 60 {
        return None;
    }

    let (seconds, millis) = match seconds_part.split_once('.') {
        Some((s, frac)) if !frac.is_empty() && frac.len() <= 3 => {
            let digits = format!("{:0<3}", frac);
            (s.parse::<i64>().ok()?, digits.parse::<i64>().ok()?)
        }
        Some(_) => return None,
        None => (seconds_part.parse::<i64>().ok()?, 0),
    };
    if hours < 0 || minutes < 0 || seconds < 0 || seconds >= 60 {
        return None;
    }

    let total = hours
        .checked_mul(3600)?
        .checked_add(minutes * 60 + seconds)?
        .checked_mul(1000)?
        .checked_add(millis)?;
    Some(if negative { -total } else { total })
}

struct DurationHandler;

impl ValueHandler for DurationHandler {
    fn format(&self, value: &Value, config: &FormatConfig) -> String {
        match value.as_i64() {
            Some(ms) => format_duration(ms),
            None => format_value(value, config),
        }
    }

    fn scan(&self, cell: &str, _config: &FormatConfig) -> Result<Value> {
        parse_duration(cell)
            .map(Value::Int)
            .ok_or_else(|| Error::parse("duration (h:mm:ss)", cell))
    }

    fn zero(&self) -> Value {
        Value::Int(0)
    }
}

/// Money amount without currency, formatted with [`FormatConfig::money`].
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
pub struct Amount(pub f64);

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(AMOUNT_TOKEN, &self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a money amount")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Amount, E> {
                Ok(Amount(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Amount, E> {
                Ok(Amount(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Amount, E> {
                Ok(Amount(v as f64))
            }

            fn visit_newtype_struct<D: Deserializer<'de>>(
                self,
                deserializer: D,
            ) -> std::result::Result<Amount, D::Error> {
                deserializer.deserialize_f64(self)
            }
        }

        deserializer.deserialize_newtype_struct(AMOUNT_TOKEN, AmountVisitor)
    }
}

pub(crate) struct AmountHandler;

impl ValueHandler for AmountHandler {
    fn format(&self, value: &Value, config: &FormatConfig) -> String {
        match value.as_f64() {
            Some(amount) => config.money.format(amount),
            None => format_value(value, config),
        }
    }

    fn scan(&self, cell: &str, config: &FormatConfig) -> Result<Value> {
        config
            .money
            .parse(cell)
            .map(Value::Float)
            .map_err(|_| Error::parse("money amount", cell))
    }

    fn zero(&self) -> Value {
        Value::Float(0.0)
    }
}

/// Money amount with an ISO 4217 currency code.
///
/// # Examples
///
/// ```rust
/// use structtable::types::CurrencyAmount;
/// use structtable::{format_value, scan, to_value, FormatConfig};
///
/// let price = CurrencyAmount::new("EUR", 1234.5);
/// let config = FormatConfig::new();
/// assert_eq!(format_value(&to_value(&price).unwrap(), &config), "EUR 1,234.50");
///
/// let back: CurrencyAmount = scan("1,234.50 EUR", &config).unwrap();
/// assert_eq!(back, price);
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct CurrencyAmount {
    pub currency: String,
    pub amount: f64,
}

impl CurrencyAmount {
    #[must_use]
    pub fn new(currency: impl Into<String>, amount: f64) -> Self {
        CurrencyAmount {
            currency: currency.into(),
            amount,
        }
    }
}

impl Serialize for CurrencyAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(CURRENCY_AMOUNT_TOKEN, &(&self.currency, self.amount))
    }
}

impl<'de> Deserialize<'de> for CurrencyAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct CurrencyAmountVisitor;

        impl<'de> Visitor<'de> for CurrencyAmountVisitor {
            type Value = CurrencyAmount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a (currency, amount) pair")
            }

            fn visit_newtype_struct<D: Deserializer<'de>>(
                self,
                deserializer: D,
            ) -> std::result::Result<CurrencyAmount, D::Error> {
                let (currency, amount) = <(String, f64)>::deserialize(deserializer)?;
                Ok(CurrencyAmount { currency, amount })
            }

            fn visit_seq<A: de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<CurrencyAmount, A::Error> {
                let currency = seq
                    .next_element::<String>()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let amount = seq
                    .next_element::<f64>()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                Ok(CurrencyAmount { currency, amount })
            }
        }

        deserializer.deserialize_newtype_struct(CURRENCY_AMOUNT_TOKEN, CurrencyAmountVisitor)
    }
}

fn is_currency_code(token: &str) -> bool {
    token.len() == 3 && token.chars().all(|c| c.is_ascii_uppercase())
}

struct CurrencyAmountHandler;

impl ValueHandler for CurrencyAmountHandler {
    fn format(&self, value: &Value, config: &FormatConfig) -> String {
        let (currency, amount) = match value {
            Value::Seq(items) if items.len() == 2 => (items[0].as_str(), items[1].as_f64()),
            _ => (None, None),
        };
        let (Some(currency), Some(amount)) = (currency, amount) else {
            return format_value(value, config);
        };

        let amount = config.money.format(amount);
        match (currency.is_empty(), config.money.currency_first) {
            (true, _) => amount,
            (false, true) => format!("{} {}", currency, amount),
            (false, false) => format!("{} {}", amount, currency),
        }
    }

    fn scan(&self, cell: &str, config: &FormatConfig) -> Result<Value> {
        let tokens: Vec<&str> = cell.split_whitespace().collect();
        let (currency, amount) = match tokens.as_slice() {
            [amount] => ("", *amount),
            [a, b] if is_currency_code(a) => (*a, *b),
            [a, b] if is_currency_code(b) => (*b, *a),
            _ => return Err(Error::parse("currency amount", cell)),
        };
        let amount = config
            .money
            .parse(amount)
            .map_err(|_| Error::parse("currency amount", cell))?;
        Ok(Value::Seq(vec![Value::from(currency), Value::Float(amount)]))
    }

    fn zero(&self) -> Value {
        Value::Seq(vec![Value::from(""), Value::Float(0.0)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::de::scan;
    use crate::options::MoneyFormat;
    use crate::ser::to_value;

    #[test]
    fn test_date_layouts() {
        let date = Date::from_ymd(2023, 12, 24).unwrap();
        let value = to_value(&date).unwrap();
        assert_eq!(format_value(&value, &FormatConfig::new()), "2023-12-24");
        assert_eq!(format_value(&value, &FormatConfig::german()), "24.12.2023");

        let back: Date = scan("24.12.2023", &FormatConfig::german()).unwrap();
        assert_eq!(back, date);
        assert!(scan::<Date>("someday", &FormatConfig::new()).is_err());
    }

    #[test]
    fn test_date_without_handler_is_iso_text() {
        let config = FormatConfig::new().without_handler(DATE_TOKEN);
        let date = Date::from_ymd(2020, 2, 29).unwrap();
        assert_eq!(format_value(&to_value(&date).unwrap(), &config), "2020-02-29");
        let back: Date = scan("2020-02-29", &config).unwrap();
        assert_eq!(back, date);
    }

    #[test]
    fn test_date_time_round_trip() {
        let time = DateTime(Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap());
        let config = FormatConfig::new();
        let text = format_value(&to_value(&time).unwrap(), &config);
        assert_eq!(text, "2024-05-06T07:08:09+00:00");
        let back: DateTime = scan(&text, &config).unwrap();
        assert_eq!(back, time);

        let german = FormatConfig::german();
        let text = format_value(&to_value(&time).unwrap(), &german);
        assert_eq!(text, "06.05.2024 07:08:09");
        let back: DateTime = scan(&text, &german).unwrap();
        assert_eq!(back, time);
    }

    #[test]
    fn test_duration_text() {
        assert_eq!(format_duration(0), "0:00:00");
        assert_eq!(format_duration(7_141_000), "1:59:01");
        assert_eq!(format_duration(90_000_250), "25:00:00.250");
        assert_eq!(format_duration(-61_000), "-0:01:01");

        assert_eq!(parse_duration("1:59:01"), Some(7_141_000));
        assert_eq!(parse_duration("25:00:00.25"), Some(90_000_250));
        assert_eq!(parse_duration("-0:01:01"), Some(-61_000));
        assert_eq!(parse_duration("1:75:00"), None);
        assert_eq!(parse_duration("12"), None);
    }

    #[test]
    fn test_duration_scan() {
        let d: Duration = scan("2:00:00", &FormatConfig::new()).unwrap();
        assert_eq!(d, Duration(chrono::Duration::hours(2)));
    }

    #[test]
    fn test_currency_placement() {
        let price = to_value(&CurrencyAmount::new("USD", -5.0)).unwrap();
        assert_eq!(format_value(&price, &FormatConfig::new()), "USD -5.00");
        assert_eq!(format_value(&price, &FormatConfig::german()), "USD -5,00");
        let trailing = FormatConfig::german().with_money(MoneyFormat {
            currency_first: false,
            ..MoneyFormat::german()
        });
        assert_eq!(format_value(&price, &trailing), "-5,00 USD");

        let bare = to_value(&CurrencyAmount::new("", 3.0)).unwrap();
        assert_eq!(format_value(&bare, &FormatConfig::new()), "3.00");
    }

    #[test]
    fn test_currency_scan_rejects_garbage() {
        let config = FormatConfig::new();
        assert!(scan::<CurrencyAmount>("EUR", &config).is_err());
        assert!(scan::<CurrencyAmount>("1 2 3", &config).is_err());
        let plain: CurrencyAmount = scan("7.25", &config).unwrap();
        assert_eq!(plain, CurrencyAmount::new("", 7.25));
    }

    #[test]
    fn test_wrappers_with_other_formats() {
        let json = serde_json::to_string(&Amount(2.5)).unwrap();
        assert_eq!(json, "2.5");
        let date: Date = serde_json::from_str("\"2021-07-01\"").unwrap();
        assert_eq!(date, Date::from_ymd(2021, 7, 1).unwrap());
        let price: CurrencyAmount = serde_json::from_str("[\"CHF\", 9.5]").unwrap();
        assert_eq!(price, CurrencyAmount::new("CHF", 9.5));
    }
}
