//! Scanner half of the value coercion engine.
//!
//! Reading a table is serde deserialization: the destination type's
//! `Deserialize` impl asks for the shape it needs and one of the
//! deserializers below answers from a cell string.
//!
//! - [`CellDeserializer`] parses one cell into a primitive, a unit enum, an
//!   `Option`, or a custom type with a registered [`ValueHandler`].
//! - [`ValueDeserializer`] replays a [`Value`] produced by a handler.
//! - [`ZeroDeserializer`] produces the zero value of any type, for fields no
//!   column is bound to.
//! - `RowDeserializer` walks one record (and its embedded records) and picks
//!   one of the above per field.
//!
//! ## Examples
//!
//! ```rust
//! use structtable::{scan, FormatConfig};
//!
//! let german = FormatConfig::german();
//! let n: f64 = scan("1234,5", &german).unwrap();
//! assert_eq!(n, 1234.5);
//!
//! let yes: bool = scan("ja", &german).unwrap();
//! assert!(yes);
//!
//! let missing: Option<i32> = scan("", &german).unwrap();
//! assert_eq!(missing, None);
//! ```
//!
//! [`ValueHandler`]: crate::ValueHandler

use crate::error::{Error, Result};
use crate::options::FormatConfig;
use crate::value::Value;
use serde::de::{self, DeserializeOwned, IntoDeserializer};
use serde::{forward_to_deserialize_any, Deserializer as _};
use std::any::type_name;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

/// Parses a single cell into `T`.
///
/// # Errors
///
/// [`Error::Parse`] if the cell is not a valid `T` under `config`.
pub fn scan<T: DeserializeOwned>(cell: &str, config: &FormatConfig) -> Result<T> {
    T::deserialize(CellDeserializer::new(cell, config))
}

/// Deserializer over the text of one cell.
pub struct CellDeserializer<'a> {
    cell: &'a str,
    config: &'a FormatConfig,
}

impl<'a> CellDeserializer<'a> {
    #[must_use]
    pub fn new(cell: &'a str, config: &'a FormatConfig) -> Self {
        CellDeserializer { cell, config }
    }

    fn is_null(&self) -> bool {
        self.cell.trim().is_empty() || self.cell == self.config.null_token
    }

    fn parse_bool(&self) -> Result<bool> {
        let text = self.cell.trim();
        let matches = |token: &str| !token.is_empty() && text.eq_ignore_ascii_case(token);
        if matches(&self.config.true_token) || matches("true") || text == "1" {
            Ok(true)
        } else if matches(&self.config.false_token) || matches("false") || text == "0" {
            Ok(false)
        } else {
            Err(Error::parse("bool", self.cell))
        }
    }

    fn parse_integer<T: FromStr>(&self) -> Result<T> {
        let text = self.cell.trim();
        let text = text.strip_prefix('+').unwrap_or(text);
        let digits: String = match self.config.float.thousands_separator {
            Some(sep) => text.chars().filter(|&c| c != sep).collect(),
            None => text.to_string(),
        };
        digits
            .parse::<T>()
            .map_err(|_| Error::parse(type_name::<T>(), self.cell))
    }

    fn scan_with_handler(&self, name: &str) -> Option<Result<Value>> {
        self.config
            .handlers
            .get(name)
            .map(|handler| handler.scan(self.cell, self.config))
    }
}

macro_rules! deserialize_integer {
    ($($method:ident => $visit:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                visitor.$visit(self.parse_integer::<$ty>()?)
            }
        )*
    };
}

impl<'de, 'a> de::Deserializer<'de> for CellDeserializer<'a> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_str(self.cell)
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_bool(self.parse_bool()?)
    }

    deserialize_integer! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_f32(self.config.float.parse(self.cell)? as f32)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_f64(self.config.float.parse(self.cell)?)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let mut chars = self.cell.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(Error::parse("char", self.cell)),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_str(self.cell)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_str(self.cell)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_bytes(self.cell.as_bytes())
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_bytes(self.cell.as_bytes())
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.is_null() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.is_null() {
            visitor.visit_unit()
        } else {
            Err(Error::parse("unit", self.cell))
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.scan_with_handler(name) {
            Some(value) => visitor.visit_newtype_struct(ValueDeserializer::new(value?)),
            None => visitor.visit_newtype_struct(self),
        }
    }

    fn deserialize_seq<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::parse("sequence", self.cell))
    }

    fn deserialize_tuple<V>(self, _len: usize, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::parse("tuple", self.cell))
    }

    fn deserialize_tuple_struct<V>(
        self,
        name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::parse(name, self.cell))
    }

    fn deserialize_map<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::parse("map", self.cell))
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.scan_with_handler(name) {
            Some(value) => ValueDeserializer::new(value?).deserialize_struct(name, fields, visitor),
            None => Err(Error::parse(name, self.cell)),
        }
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_enum(self.cell.trim().into_deserializer())
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_str(self.cell)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: std::vec::IntoIter<(Value, Value)>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(entries: Vec<(Value, Value)>) -> Self {
        MapDeserializer {
            iter: entries.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: &'static str,
    value: Value,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(variant_name(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Value,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null => Ok(()),
            _ => Err(Error::custom("expected unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(ValueDeserializer::new(self.value))
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Seq(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            _ => Err(Error::custom("expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Record { fields, .. } => visitor.visit_map(record_entries(fields)),
            _ => Err(Error::custom("expected struct variant")),
        }
    }
}

fn variant_name(name: &'static str) -> de::value::StrDeserializer<'static, Error> {
    <&'static str as IntoDeserializer<'static, Error>>::into_deserializer(name)
}

fn record_entries(fields: crate::map::FieldMap) -> MapDeserializer {
    MapDeserializer::new(
        fields
            .into_iter()
            .map(|(key, value)| (Value::String(key), value))
            .collect(),
    )
}

/// Deserializer replaying a [`Value`].
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    #[must_use]
    pub fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Int(i) => visitor.visit_i64(i),
            Value::Uint(u) => visitor.visit_u64(u),
            Value::BigInt(b) => match i128::try_from(&b) {
                Ok(i) => visitor.visit_i128(i),
                Err(_) => match u128::try_from(&b) {
                    Ok(u) => visitor.visit_u128(u),
                    Err(_) => visitor.visit_string(b.to_string()),
                },
            },
            Value::Float(f) => visitor.visit_f64(f),
            Value::String(s) | Value::Display(s) => visitor.visit_string(s),
            Value::Bytes(bytes) => visitor.visit_byte_buf(bytes),
            Value::Seq(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            Value::Map(entries) => visitor.visit_map(MapDeserializer::new(entries)),
            Value::Record { fields, .. } => visitor.visit_map(record_entries(fields)),
            Value::Named { value, .. } => visitor.visit_newtype_struct(ValueDeserializer::new(*value)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Named { value, .. } => visitor.visit_newtype_struct(ValueDeserializer::new(*value)),
            other => visitor.visit_newtype_struct(ValueDeserializer::new(other)),
        }
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(s) | Value::Display(s) => visitor.visit_enum(s.into_deserializer()),
            Value::Named { name, value } => visitor.visit_enum(EnumDeserializer {
                variant: name,
                value: *value,
            }),
            Value::Record { name, fields } => visitor.visit_enum(EnumDeserializer {
                variant: name,
                value: Value::Record { name, fields },
            }),
            other => Err(Error::custom(format!(
                "expected enum, found {}",
                other.kind()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

/// Deserializer producing the zero value of the requested type.
///
/// Numbers are zero, strings empty, options `None`, enums their first
/// variant. Custom types with a registered handler get
/// [`ValueHandler::zero`](crate::ValueHandler::zero).
pub struct ZeroDeserializer<'a> {
    config: &'a FormatConfig,
}

impl<'a> ZeroDeserializer<'a> {
    #[must_use]
    pub fn new(config: &'a FormatConfig) -> Self {
        ZeroDeserializer { config }
    }
}

macro_rules! deserialize_zero {
    ($($method:ident => $visit:ident($zero:expr)),* $(,)?) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                visitor.$visit($zero)
            }
        )*
    };
}

impl<'de, 'a> de::Deserializer<'de> for ZeroDeserializer<'a> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    deserialize_zero! {
        deserialize_bool => visit_bool(false),
        deserialize_i8 => visit_i8(0),
        deserialize_i16 => visit_i16(0),
        deserialize_i32 => visit_i32(0),
        deserialize_i64 => visit_i64(0),
        deserialize_i128 => visit_i128(0),
        deserialize_u8 => visit_u8(0),
        deserialize_u16 => visit_u16(0),
        deserialize_u32 => visit_u32(0),
        deserialize_u64 => visit_u64(0),
        deserialize_u128 => visit_u128(0),
        deserialize_f32 => visit_f32(0.0),
        deserialize_f64 => visit_f64(0.0),
        deserialize_char => visit_char('\0'),
        deserialize_str => visit_str(""),
        deserialize_string => visit_str(""),
        deserialize_bytes => visit_bytes(&[]),
        deserialize_byte_buf => visit_bytes(&[]),
        deserialize_identifier => visit_str(""),
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_none()
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V>(self, name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.config.handlers.get(name) {
            Some(handler) => visitor.visit_newtype_struct(ValueDeserializer::new(handler.zero())),
            None => visitor.visit_newtype_struct(self),
        }
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_seq(ZeroSeq {
            remaining: 0,
            config: self.config,
        })
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_seq(ZeroSeq {
            remaining: len,
            config: self.config,
        })
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_map(MapDeserializer::new(Vec::new()))
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.config.handlers.get(name) {
            Some(handler) => {
                ValueDeserializer::new(handler.zero()).deserialize_struct(name, fields, visitor)
            }
            None => visitor.visit_map(ZeroStruct {
                fields: fields.iter(),
                config: self.config,
            }),
        }
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match variants.first() {
            Some(&variant) => visitor.visit_enum(ZeroEnum {
                variant,
                config: self.config,
            }),
            None => Err(Error::custom(format!("enum {} has no variants", name))),
        }
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

struct ZeroSeq<'a> {
    remaining: usize,
    config: &'a FormatConfig,
}

impl<'de, 'a> de::SeqAccess<'de> for ZeroSeq<'a> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(ZeroDeserializer::new(self.config)).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

struct ZeroStruct<'a> {
    fields: std::slice::Iter<'static, &'static str>,
    config: &'a FormatConfig,
}

impl<'de, 'a> de::MapAccess<'de> for ZeroStruct<'a> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.fields.next() {
            Some(&field) => seed.deserialize(field.into_deserializer()).map(Some),
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        seed.deserialize(ZeroDeserializer::new(self.config))
    }
}

struct ZeroEnum<'a> {
    variant: &'static str,
    config: &'a FormatConfig,
}

impl<'de, 'a> de::EnumAccess<'de> for ZeroEnum<'a> {
    type Error = Error;
    type Variant = ZeroDeserializer<'a>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(variant_name(self.variant))?;
        Ok((variant, ZeroDeserializer::new(self.config)))
    }
}

impl<'de, 'a> de::VariantAccess<'de> for ZeroDeserializer<'a> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(self)
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_tuple(self, len, visitor)
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_map(ZeroStruct {
            fields: fields.iter(),
            config: self.config,
        })
    }
}

/// Which column feeds which field path of a record.
#[derive(Clone, Debug, Default)]
pub(crate) struct ReadPlan {
    record: &'static str,
    columns: HashMap<Vec<&'static str>, usize>,
    parents: HashSet<Vec<&'static str>>,
    skip_unbound: bool,
}

impl ReadPlan {
    pub(crate) fn new(record: &'static str) -> Self {
        ReadPlan {
            record,
            ..Self::default()
        }
    }

    /// Binds `column` to the field at `path`. A later binding of the same
    /// path replaces the earlier one.
    pub(crate) fn bind(&mut self, path: &[&'static str], column: usize) {
        for depth in 1..path.len() {
            self.parents.insert(path[..depth].to_vec());
        }
        self.columns.insert(path.to_vec(), column);
    }

    /// Leave unbound fields out of the record instead of zero filling them.
    pub(crate) fn skip_unbound(mut self, skip: bool) -> Self {
        self.skip_unbound = skip;
        self
    }

    /// Bound column indices.
    pub(crate) fn columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns.values().copied()
    }

    fn is_bound(&self, path: &[&'static str]) -> bool {
        self.columns.contains_key(path) || self.parents.contains(path)
    }
}

/// Deserializes one record from one raw row.
pub(crate) struct RowDeserializer<'a> {
    plan: &'a ReadPlan,
    row: &'a [String],
    row_index: usize,
    path: Vec<&'static str>,
    config: &'a FormatConfig,
}

impl<'a> RowDeserializer<'a> {
    pub(crate) fn new(
        plan: &'a ReadPlan,
        row: &'a [String],
        row_index: usize,
        config: &'a FormatConfig,
    ) -> Self {
        RowDeserializer {
            plan,
            row,
            row_index,
            path: Vec::new(),
            config,
        }
    }

    fn child(&self, field: &'static str) -> Self {
        let mut path = self.path.clone();
        path.push(field);
        RowDeserializer {
            plan: self.plan,
            row: self.row,
            row_index: self.row_index,
            path,
            config: self.config,
        }
    }
}

impl<'de, 'a> de::Deserializer<'de> for RowDeserializer<'a> {
    type Error = Error;

    fn deserialize_any<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::schema_contract(format!(
            "{} is not a record",
            self.plan.record
        )))
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_map(RowFields {
            row: self,
            fields: fields.iter(),
            current: None,
        })
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

struct RowFields<'a> {
    row: RowDeserializer<'a>,
    fields: std::slice::Iter<'static, &'static str>,
    current: Option<&'static str>,
}

impl<'de, 'a> de::MapAccess<'de> for RowFields<'a> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        for &field in self.fields.by_ref() {
            if self.row.plan.skip_unbound && !self.row.plan.is_bound(&self.row.child(field).path) {
                continue;
            }
            self.current = Some(field);
            return seed.deserialize(field.into_deserializer()).map(Some);
        }
        Ok(None)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        let Some(field) = self.current.take() else {
            return Err(Error::custom("next_value_seed called before next_key_seed"));
        };
        let row = &self.row;
        let child = row.child(field);

        if let Some(&column) = row.plan.columns.get(&child.path) {
            let cell = row.row.get(column).ok_or(Error::ColumnOutOfBounds {
                row: row.row_index,
                column,
                len: row.row.len(),
            })?;
            return seed
                .deserialize(CellDeserializer::new(cell, row.config))
                .map_err(|err| Error::scan(row.row_index, column, cell, err));
        }
        if row.plan.parents.contains(&child.path) {
            return seed.deserialize(child);
        }
        seed.deserialize(ZeroDeserializer::new(row.config))
            .map_err(|err| Error::unfilled(row.row_index, &child.path, err))
    }

    fn size_hint(&self) -> Option<usize> {
        (!self.row.plan.skip_unbound).then(|| self.fields.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    enum Level {
        Low,
        High,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Inner {
        a: i32,
        b: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Outer {
        name: String,
        inner: Inner,
        level: Level,
        note: Option<String>,
    }

    #[test]
    fn test_scan_integers() {
        let config = FormatConfig::new().with_thousands_separator(Some(','));
        assert_eq!(scan::<i64>("1,234,567", &config).unwrap(), 1_234_567);
        assert_eq!(scan::<u8>(" +7 ", &config).unwrap(), 7);
        assert!(matches!(scan::<u8>("300", &config), Err(Error::Parse { .. })));
        assert!(scan::<u32>("-1", &config).is_err());
    }

    #[test]
    fn test_scan_bool_tokens() {
        let config = FormatConfig::english();
        assert!(scan::<bool>("YES", &config).unwrap());
        assert!(!scan::<bool>("no", &config).unwrap());
        assert!(scan::<bool>("1", &config).unwrap());
        assert!(!scan::<bool>("false", &config).unwrap());
        assert!(scan::<bool>("maybe", &config).is_err());
    }

    #[test]
    fn test_scan_option_null_token() {
        let config = FormatConfig::new().with_null_token("N/A");
        assert_eq!(scan::<Option<i32>>("N/A", &config).unwrap(), None);
        assert_eq!(scan::<Option<i32>>("  ", &config).unwrap(), None);
        assert_eq!(scan::<Option<i32>>("4", &config).unwrap(), Some(4));
    }

    #[test]
    fn test_scan_unit_enum_and_char() {
        let config = FormatConfig::new();
        assert_eq!(scan::<Level>("High", &config).unwrap(), Level::High);
        assert!(scan::<Level>("Medium", &config).is_err());
        assert_eq!(scan::<char>("x", &config).unwrap(), 'x');
        assert!(scan::<char>("xy", &config).is_err());
    }

    #[test]
    fn test_scan_rejects_collections() {
        assert!(scan::<Vec<i32>>("1 2", &FormatConfig::new()).is_err());
    }

    #[test]
    fn test_zero_values() {
        let config = FormatConfig::new();
        let outer = Outer::deserialize(ZeroDeserializer::new(&config)).unwrap();
        assert_eq!(
            outer,
            Outer {
                name: String::new(),
                inner: Inner { a: 0, b: String::new() },
                level: Level::Low,
                note: None,
            }
        );
    }

    #[test]
    fn test_zero_uses_handler() {
        let config = FormatConfig::new();
        let date = crate::types::Date::deserialize(ZeroDeserializer::new(&config)).unwrap();
        assert_eq!(date, crate::types::Date::from_ymd(1970, 1, 1).unwrap());
    }

    #[test]
    fn test_row_deserializer_follows_plan() {
        let mut plan = ReadPlan::new("Outer");
        plan.bind(&["name"], 2);
        plan.bind(&["inner", "a"], 0);
        plan.bind(&["level"], 1);

        let row: Vec<String> = vec!["42".into(), "High".into(), "Ann".into()];
        let config = FormatConfig::new();
        let outer = Outer::deserialize(RowDeserializer::new(&plan, &row, 3, &config)).unwrap();
        assert_eq!(outer.name, "Ann");
        assert_eq!(outer.inner, Inner { a: 42, b: String::new() });
        assert_eq!(outer.level, Level::High);
        assert_eq!(outer.note, None);
    }

    #[test]
    fn test_row_errors_carry_position() {
        let mut plan = ReadPlan::new("Outer");
        plan.bind(&["inner", "a"], 1);
        let row: Vec<String> = vec!["x".into(), "abc".into()];
        let config = FormatConfig::new();
        let err = Outer::deserialize(RowDeserializer::new(&plan, &row, 5, &config)).unwrap_err();
        match err {
            Error::Scan {
                row, column, value, ..
            } => {
                assert_eq!((row, column), (5, 1));
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_row_short_row_is_bounds_error() {
        let mut plan = ReadPlan::new("Outer");
        plan.bind(&["name"], 4);
        let row: Vec<String> = vec!["a".into()];
        let config = FormatConfig::new();
        let err = Outer::deserialize(RowDeserializer::new(&plan, &row, 0, &config)).unwrap_err();
        assert!(matches!(err, Error::ColumnOutOfBounds { column: 4, len: 1, .. }));
    }

    #[test]
    fn test_row_into_non_record() {
        let plan = ReadPlan::new("i32");
        let row: Vec<String> = Vec::new();
        let config = FormatConfig::new();
        let err = i32::deserialize(RowDeserializer::new(&plan, &row, 0, &config)).unwrap_err();
        assert!(matches!(err, Error::SchemaContract(_)));
    }

    #[test]
    fn test_value_deserializer_enum_shapes() {
        #[derive(Debug, Deserialize, PartialEq)]
        enum Shape {
            Dot,
            Circle(f64),
            Rect { w: i64, h: i64 },
        }

        let value = Value::Named {
            name: "Circle",
            value: Box::new(Value::Float(1.5)),
        };
        assert_eq!(
            Shape::deserialize(ValueDeserializer::new(value)).unwrap(),
            Shape::Circle(1.5)
        );

        let mut fields = crate::map::FieldMap::new();
        fields.insert("w".to_string(), Value::Int(2));
        fields.insert("h".to_string(), Value::Int(3));
        let value = Value::Record {
            name: "Rect",
            fields,
        };
        assert_eq!(
            Shape::deserialize(ValueDeserializer::new(value)).unwrap(),
            Shape::Rect { w: 2, h: 3 }
        );
        assert_eq!(
            Shape::deserialize(ValueDeserializer::new(Value::from("Dot"))).unwrap(),
            Shape::Dot
        );
    }
}
