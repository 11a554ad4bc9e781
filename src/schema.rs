//! Record schemas and the field introspector.
//!
//! A [`Record`] declares its fields with the [`Schema`] builder: names in
//! serde field order, optional titles per tag namespace, embedded sub-records
//! and private fields. [`flatten`] turns a schema into the ordered list of
//! visible leaf fields; [`field_values`] pulls the matching values out of a
//! record instance in the same order.
//!
//! Field names must be the names serde uses for the fields (after any
//! `#[serde(rename)]`), since values are located by name in the serialized
//! record.
//!
//! Embed a sub-record as a nested field declared with [`Field::embedded`].
//! `#[serde(flatten)]` is not supported: it makes the record serialize as a
//! map, which [`field_values`] rejects with [`Error::SchemaContract`].
//!
//! ## Examples
//!
//! ```rust
//! use serde::Serialize;
//! use structtable::{flatten, Field, Record, Schema};
//!
//! #[derive(Serialize)]
//! struct Address { city: String, zip: String }
//!
//! impl Record for Address {
//!     fn schema() -> Schema {
//!         Schema::new("Address").field(Field::new("city")).field(Field::new("zip"))
//!     }
//! }
//!
//! #[derive(Serialize)]
//! struct Person { name: String, address: Address, token: String }
//!
//! impl Record for Person {
//!     fn schema() -> Schema {
//!         Schema::new("Person")
//!             .field(Field::new("name").title("Full Name"))
//!             .field(Field::embedded("address", Address::schema))
//!             .field(Field::new("token").private())
//!     }
//! }
//!
//! let names: Vec<_> = flatten(&Person::schema()).iter().map(|f| f.name).collect();
//! assert_eq!(names, vec!["name", "city", "zip"]);
//! ```

use crate::error::{Error, Result};
use crate::ser::to_value;
use crate::value::Value;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Tag namespace of [`Field::title`].
pub const DEFAULT_TAG: &str = "col";

/// Title that removes a field from the table.
pub const DEFAULT_IGNORE_TITLE: &str = "-";

/// Embedding levels followed before a sub-record is skipped.
pub const MAX_EMBED_DEPTH: usize = 32;

/// A serializable type with a declared table schema.
pub trait Record: Serialize {
    fn schema() -> Schema;
}

impl<T: Record> Record for Box<T> {
    fn schema() -> Schema {
        T::schema()
    }
}

/// Ordered field declarations of one record type.
#[derive(Clone, Debug)]
pub struct Schema {
    name: &'static str,
    fields: Vec<Field>,
}

impl Schema {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Schema {
            name,
            fields: Vec::new(),
        }
    }

    /// Appends a field declaration.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

/// Declaration of one field.
#[derive(Clone, Debug)]
pub struct Field {
    name: &'static str,
    tags: Vec<(String, String)>,
    embedded: Option<fn() -> Schema>,
    visible: bool,
}

impl Field {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Field {
            name,
            tags: Vec::new(),
            embedded: None,
            visible: true,
        }
    }

    /// A field whose own fields are spliced in at this position.
    #[must_use]
    pub fn embedded(name: &'static str, schema: fn() -> Schema) -> Self {
        Field {
            embedded: Some(schema),
            ..Field::new(name)
        }
    }

    /// Sets the title in the default `col` namespace.
    #[must_use]
    pub fn title(self, title: impl Into<String>) -> Self {
        self.tag(DEFAULT_TAG, title)
    }

    /// Titles the field with the ignore sentinel `-`.
    #[must_use]
    pub fn ignore(self) -> Self {
        self.title(DEFAULT_IGNORE_TITLE)
    }

    /// Sets the annotation of `namespace`, replacing a previous one.
    #[must_use]
    pub fn tag(mut self, namespace: impl Into<String>, value: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.tags.retain(|(ns, _)| *ns != namespace);
        self.tags.push((namespace, value.into()));
        self
    }

    /// Hides the field from tables at any depth.
    #[must_use]
    pub fn private(mut self) -> Self {
        self.visible = false;
        self
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_embedded(&self) -> bool {
        self.embedded.is_some()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// A visible leaf field of a flattened schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Names of the embedding fields followed by `name`.
    pub path: Vec<&'static str>,
    pub tags: Vec<(String, String)>,
}

impl FieldDescriptor {
    /// Raw annotation of `namespace`.
    #[must_use]
    pub fn tag(&self, namespace: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(ns, _)| ns == namespace)
            .map(|(_, value)| value.as_str())
    }

    /// Annotation of `namespace` up to its first `,`, if not empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use structtable::FieldDescriptor;
    ///
    /// let field = FieldDescriptor {
    ///     name: "bytes",
    ///     path: vec!["bytes"],
    ///     tags: vec![("col".into(), "Raw Bytes,omitempty".into())],
    /// };
    /// assert_eq!(field.title("col"), Some("Raw Bytes"));
    /// assert_eq!(field.title("csv"), None);
    /// ```
    #[must_use]
    pub fn title(&self, namespace: &str) -> Option<&str> {
        let tag = self.tag(namespace)?;
        let title = tag.split(',').next().unwrap_or(tag);
        (!title.is_empty()).then_some(title)
    }
}

/// A flattened schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatSchema {
    pub record: &'static str,
    pub fields: Vec<FieldDescriptor>,
}

/// Ordered visible leaf fields of `schema`, depth first.
#[must_use]
pub fn flatten(schema: &Schema) -> Vec<FieldDescriptor> {
    let mut fields = Vec::with_capacity(schema.fields.len());
    flatten_into(schema, &mut Vec::new(), 0, &mut fields);
    fields
}

fn flatten_into(
    schema: &Schema,
    prefix: &mut Vec<&'static str>,
    depth: usize,
    out: &mut Vec<FieldDescriptor>,
) {
    for field in schema.fields.iter().filter(|f| f.visible) {
        match field.embedded {
            Some(sub_schema) => {
                if depth >= MAX_EMBED_DEPTH {
                    tracing::warn!(
                        record = schema.name,
                        field = field.name,
                        depth,
                        "embedding depth limit reached, skipping embedded field"
                    );
                    continue;
                }
                prefix.push(field.name);
                flatten_into(&sub_schema(), prefix, depth + 1, out);
                prefix.pop();
            }
            None => {
                let mut path = prefix.clone();
                path.push(field.name);
                out.push(FieldDescriptor {
                    name: field.name,
                    path,
                    tags: field.tags.clone(),
                });
            }
        }
    }
}

static FLAT_SCHEMAS: Lazy<RwLock<HashMap<TypeId, Arc<FlatSchema>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Flattened schema of `T`, computed once per type.
#[must_use]
pub fn flat_schema<T: Record + 'static>() -> Arc<FlatSchema> {
    let key = TypeId::of::<T>();
    if let Some(cached) = FLAT_SCHEMAS.read().ok().and_then(|cache| cache.get(&key).cloned()) {
        return cached;
    }

    tracing::trace!(record = type_name::<T>(), "flattening record schema");
    let schema = T::schema();
    let flat = Arc::new(FlatSchema {
        record: schema.name,
        fields: flatten(&schema),
    });
    match FLAT_SCHEMAS.write() {
        Ok(mut cache) => Arc::clone(cache.entry(key).or_insert(flat)),
        Err(_) => flat,
    }
}

/// Values of the flattened `fields` of one record, index aligned with `fields`.
///
/// A field missing from the serialized record (or below an embedded field that
/// serialized as `None`) yields [`Value::Null`].
///
/// # Errors
///
/// [`Error::SchemaContract`] if `record` does not serialize as a struct.
pub fn field_values<T>(fields: &[FieldDescriptor], record: &T) -> Result<Vec<Value>>
where
    T: ?Sized + Serialize,
{
    let mut value = to_value(record)?;
    if !value.is_record() {
        return Err(Error::schema_contract(format!(
            "{} is not a record, it serializes as {}",
            type_name::<T>(),
            value.kind()
        )));
    }
    Ok(fields.iter().map(|f| take_path(&mut value, &f.path)).collect())
}

fn take_path(value: &mut Value, path: &[&str]) -> Value {
    let Some((last, parents)) = path.split_last() else {
        return Value::Null;
    };
    parents
        .iter()
        .try_fold(value, |current, name| current.as_record_mut()?.get_mut(name))
        .and_then(|parent| parent.as_record_mut()?.take(last))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Inner {
        a: i32,
        secret: i32,
    }

    impl Record for Inner {
        fn schema() -> Schema {
            Schema::new("Inner")
                .field(Field::new("a"))
                .field(Field::new("secret").private())
        }
    }

    #[derive(Serialize)]
    struct Outer {
        first: &'static str,
        inner: Option<Inner>,
        last: bool,
    }

    impl Record for Outer {
        fn schema() -> Schema {
            Schema::new("Outer")
                .field(Field::new("first"))
                .field(Field::embedded("inner", Inner::schema))
                .field(Field::new("last"))
        }
    }

    #[derive(Serialize)]
    struct Looping {
        x: i32,
    }

    impl Record for Looping {
        fn schema() -> Schema {
            Schema::new("Looping")
                .field(Field::new("x"))
                .field(Field::embedded("again", Looping::schema))
        }
    }

    #[test]
    fn test_flatten_splices_embedded_in_place() {
        let fields = flatten(&Outer::schema());
        let paths: Vec<_> = fields.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, vec![vec!["first"], vec!["inner", "a"], vec!["last"]]);
    }

    #[test]
    fn test_field_values_aligned() {
        let flat = flat_schema::<Outer>();
        let record = Outer {
            first: "x",
            inner: Some(Inner { a: 5, secret: 9 }),
            last: true,
        };
        let values = field_values(&flat.fields, &record).unwrap();
        assert_eq!(values, vec![Value::from("x"), Value::Int(5), Value::Bool(true)]);

        let empty = Outer {
            first: "y",
            inner: None,
            last: false,
        };
        let values = field_values(&flat.fields, &empty).unwrap();
        assert_eq!(values[1], Value::Null);
    }

    #[test]
    fn test_self_embedding_terminates() {
        let fields = flatten(&Looping::schema());
        assert_eq!(fields.len(), MAX_EMBED_DEPTH + 1);
        assert!(fields.iter().all(|f| f.name == "x"));
    }

    #[test]
    fn test_flat_schema_is_cached() {
        let a = flat_schema::<Outer>();
        let b = flat_schema::<Outer>();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.record, "Outer");
    }

    #[test]
    fn test_non_record_is_contract_violation() {
        let err = field_values(&[], &42).unwrap_err();
        assert!(matches!(err, Error::SchemaContract(_)));
    }

    #[test]
    fn test_tag_replaces_same_namespace() {
        let field = Field::new("a").title("A").title("B").tag("html", "Alpha");
        let flat = flatten(&Schema::new("T").field(field));
        assert_eq!(flat[0].title("col"), Some("B"));
        assert_eq!(flat[0].title("html"), Some("Alpha"));
    }

    #[test]
    fn test_serde_flatten_is_rejected() {
        #[derive(Serialize)]
        struct Flattened {
            id: u32,
            #[serde(flatten)]
            inner: Inner,
        }

        let fields = flatten(&Schema::new("Flattened").field(Field::new("id")));
        let err = field_values(
            &fields,
            &Flattened {
                id: 1,
                inner: Inner { a: 2, secret: 3 },
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaContract(ref msg) if msg.contains("serializes as map")));
    }
}
