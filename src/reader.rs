//! Table reading driver.
//!
//! A [`TableReader`] turns the raw string rows of a [`RowSource`] into
//! records. Each [`ColumnBinding`] names the field a column feeds; the name
//! is matched against the field's title in the reader's tag namespace, or
//! the field name for fields without one. Fields no column is bound to keep
//! their zero value.
//!
//! Reads are all or nothing: the first failing cell aborts the read and no
//! records are returned.
//!
//! ## Unbound fields
//!
//! With [`UnboundFields::Zero`] (the default) an unbound field is built from
//! the zero of its serde shape: `0`, `""`, `false`, `None`, the first enum
//! variant, or the handler zero of a custom type. Types that reject those
//! values, such as a plain `chrono::NaiveDate`, fail with
//! [`Error::Unfilled`]. Bind a column to them, make them `Option`, or read
//! with [`UnboundFields::Skip`], which leaves unbound fields out of the
//! record so `#[serde(default)]` applies.
//!
//! ## Examples
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use structtable::{record, ColumnBinding, StringRows, TableReader};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Stock { sku: String, count: u32 }
//!
//! record!(Stock { sku: "SKU", count });
//!
//! let rows = StringRows::from(vec![
//!     vec!["SKU", "Count"],
//!     vec!["A-1", "12"],
//! ]);
//! let reader = TableReader::new(vec![
//!     ColumnBinding::new(0, "SKU"),
//!     ColumnBinding::new(1, "count"),
//! ]);
//! let out = reader.read::<Stock, _>(&rows, 1).unwrap();
//! assert_eq!(out.header_rows, vec![vec!["SKU", "Count"]]);
//! assert_eq!(out.records, vec![Stock { sku: "A-1".into(), count: 12 }]);
//! ```

use crate::de::{ReadPlan, RowDeserializer};
use crate::error::{Error, Result};
use crate::options::FormatConfig;
use crate::schema::{flat_schema, FlatSchema, Record, DEFAULT_TAG};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Random access to raw rows.
pub trait RowSource {
    fn row_count(&self) -> usize;

    /// Cells of the row at `index`.
    ///
    /// # Errors
    ///
    /// [`Error::RowOutOfBounds`] if `index >= row_count()`.
    fn raw_row(&self, index: usize) -> Result<&[String]>;
}

fn row_at(rows: &[Vec<String>], index: usize) -> Result<&[String]> {
    rows.get(index)
        .map(Vec::as_slice)
        .ok_or(Error::RowOutOfBounds {
            index,
            len: rows.len(),
        })
}

impl RowSource for [Vec<String>] {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn raw_row(&self, index: usize) -> Result<&[String]> {
        row_at(self, index)
    }
}

impl RowSource for Vec<Vec<String>> {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn raw_row(&self, index: usize) -> Result<&[String]> {
        row_at(self, index)
    }
}

/// Owned rows of string cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringRows {
    rows: Vec<Vec<String>>,
}

impl StringRows {
    #[must_use]
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        StringRows { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Vec<String>> {
        self.rows
    }
}

impl<S: Into<String>> From<Vec<Vec<S>>> for StringRows {
    fn from(rows: Vec<Vec<S>>) -> Self {
        StringRows::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }
}

impl RowSource for StringRows {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn raw_row(&self, index: usize) -> Result<&[String]> {
        row_at(&self.rows, index)
    }
}

/// Column `index` feeds the field named `field`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnBinding {
    pub index: usize,
    pub field: String,
}

impl ColumnBinding {
    #[must_use]
    pub fn new(index: usize, field: impl Into<String>) -> Self {
        ColumnBinding {
            index,
            field: field.into(),
        }
    }
}

/// How a [`TableReader`] fills fields no column is bound to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnboundFields {
    /// Deserialize the zero value of the field's type.
    #[default]
    Zero,
    /// Leave the field out; the record's serde defaults decide.
    Skip,
}

#[derive(Clone, Debug)]
enum Columns {
    Bound(Vec<ColumnBinding>),
    ByPosition,
}

/// Result of [`TableReader::read`].
#[derive(Clone, Debug, PartialEq)]
pub struct ReadOutput<T> {
    /// Skipped leading rows, unparsed.
    pub header_rows: Vec<Vec<String>>,
    pub records: Vec<T>,
}

/// Reads records from raw rows.
#[derive(Clone, Debug)]
pub struct TableReader {
    columns: Columns,
    tag: String,
    config: FormatConfig,
    unbound: UnboundFields,
}

impl TableReader {
    /// A reader with explicit column bindings.
    ///
    /// Binding the same field twice keeps the later binding.
    #[must_use]
    pub fn new(columns: impl IntoIterator<Item = ColumnBinding>) -> Self {
        TableReader {
            columns: Columns::Bound(columns.into_iter().collect()),
            tag: DEFAULT_TAG.to_string(),
            config: FormatConfig::new(),
            unbound: UnboundFields::Zero,
        }
    }

    /// A reader binding column `i` to the `i`-th flattened field.
    #[must_use]
    pub fn by_position() -> Self {
        TableReader {
            columns: Columns::ByPosition,
            ..TableReader::new(Vec::new())
        }
    }

    /// Sets the namespace whose titles binding names are matched against.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: FormatConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_unbound_fields(mut self, unbound: UnboundFields) -> Self {
        self.unbound = unbound;
        self
    }

    #[must_use]
    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    fn plan(&self, flat: &FlatSchema) -> Result<ReadPlan> {
        let mut plan = ReadPlan::new(flat.record).skip_unbound(self.unbound == UnboundFields::Skip);
        match &self.columns {
            Columns::ByPosition => {
                for (index, field) in flat.fields.iter().enumerate() {
                    plan.bind(&field.path, index);
                }
            }
            Columns::Bound(bindings) => {
                for binding in bindings {
                    let field = flat
                        .fields
                        .iter()
                        .find(|f| f.title(&self.tag).map(str::trim).unwrap_or(f.name) == binding.field)
                        .ok_or_else(|| Error::UnmappedField {
                            field: binding.field.clone(),
                            record: flat.record.to_string(),
                            tag: self.tag.clone(),
                        })?;
                    plan.bind(&field.path, binding.index);
                }
            }
        }
        Ok(plan)
    }

    fn read_with_plan<T, S>(&self, plan: &ReadPlan, source: &S, index: usize) -> Result<T>
    where
        T: DeserializeOwned,
        S: RowSource + ?Sized,
    {
        let row = source.raw_row(index)?;
        if let Some(column) = plan.columns().find(|&c| c >= row.len()) {
            return Err(Error::ColumnOutOfBounds {
                row: index,
                column,
                len: row.len(),
            });
        }
        T::deserialize(RowDeserializer::new(plan, row, index, &self.config))
    }

    /// Reads the row at `index` into a new record.
    ///
    /// # Errors
    ///
    /// Bounds errors for the row or a bound column, [`Error::UnmappedField`]
    /// for a binding without matching field, [`Error::Scan`] for a cell that
    /// does not parse.
    pub fn read_row<T, S>(&self, source: &S, index: usize) -> Result<T>
    where
        T: Record + DeserializeOwned + 'static,
        S: RowSource + ?Sized,
    {
        let plan = self.plan(&flat_schema::<T>())?;
        self.read_with_plan(&plan, source, index)
    }

    /// Returns the first `header_rows` rows verbatim and every following row
    /// as a record.
    ///
    /// A `header_rows` count beyond the row count consumes all rows and
    /// yields no records.
    pub fn read<T, S>(&self, source: &S, header_rows: usize) -> Result<ReadOutput<T>>
    where
        T: Record + DeserializeOwned + 'static,
        S: RowSource + ?Sized,
    {
        let plan = self.plan(&flat_schema::<T>())?;
        let count = source.row_count();
        let skip = header_rows.min(count);

        let headers = (0..skip)
            .map(|index| source.raw_row(index).map(<[String]>::to_vec))
            .collect::<Result<Vec<_>>>()?;
        let records = (skip..count)
            .map(|index| self.read_with_plan(&plan, source, index))
            .collect::<Result<Vec<T>>>()?;

        tracing::debug!(
            records = records.len(),
            header_rows = headers.len(),
            "table read complete"
        );
        Ok(ReadOutput {
            header_rows: headers,
            records,
        })
    }

    /// Like [`TableReader::read`], assigning `dest` only if every row succeeds.
    pub fn read_into<T, S>(&self, source: &S, dest: &mut Vec<T>, header_rows: usize) -> Result<Vec<Vec<String>>>
    where
        T: Record + DeserializeOwned + 'static,
        S: RowSource + ?Sized,
    {
        let out = self.read(source, header_rows)?;
        *dest = out.records;
        Ok(out.header_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, Schema};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u32,
        label: String,
    }

    impl Record for Row {
        fn schema() -> Schema {
            Schema::new("Row")
                .field(Field::new("id"))
                .field(Field::new("label").title("Label"))
        }
    }

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_string_rows_bounds() {
        let source = StringRows::from(vec![vec!["a"]]);
        assert_eq!(source.row_count(), 1);
        assert!(matches!(
            source.raw_row(1),
            Err(Error::RowOutOfBounds { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_binding_by_title_and_name() {
        let source = rows(&[&["x", "7"]]);
        let reader = TableReader::new(vec![ColumnBinding::new(1, "id"), ColumnBinding::new(0, "Label")]);
        let row: Row = reader.read_row(&source, 0).unwrap();
        assert_eq!(row, Row { id: 7, label: "x".into() });
    }

    #[test]
    fn test_tagged_field_not_found_by_name() {
        let source = rows(&[&["x"]]);
        let reader = TableReader::new(vec![ColumnBinding::new(0, "label")]);
        let err = reader.read_row::<Row, _>(&source, 0).unwrap_err();
        match err {
            Error::UnmappedField { field, record, tag } => {
                assert_eq!(field, "label");
                assert_eq!(record, "Row");
                assert_eq!(tag, "col");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_by_position() {
        let source = rows(&[&["id", "label"], &["1", "one"], &["2", "two"]]);
        let out = TableReader::by_position().read::<Row, _>(&source, 1).unwrap();
        assert_eq!(out.header_rows, rows(&[&["id", "label"]]));
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[1], Row { id: 2, label: "two".into() });
    }

    #[test]
    fn test_skip_beyond_rows() {
        let source = rows(&[&["1", "a"]]);
        let out = TableReader::by_position().read::<Row, _>(&source, 5).unwrap();
        assert_eq!(out.header_rows.len(), 1);
        assert!(out.records.is_empty());
    }

    #[test]
    fn test_read_into_is_all_or_nothing() {
        let source = rows(&[&["1", "a"], &["oops", "b"]]);
        let mut dest = vec![Row { id: 9, label: "keep".into() }];
        let err = TableReader::by_position()
            .read_into(&source, &mut dest, 0)
            .unwrap_err();
        assert!(matches!(err, Error::Scan { row: 1, column: 0, .. }));
        assert_eq!(dest, vec![Row { id: 9, label: "keep".into() }]);
    }

    #[test]
    fn test_short_row() {
        let source = rows(&[&["1"]]);
        let err = TableReader::by_position().read::<Row, _>(&source, 0).unwrap_err();
        assert!(matches!(err, Error::ColumnOutOfBounds { row: 0, column: 1, len: 1 }));
    }

    #[test]
    fn test_binding_serde() {
        let binding: ColumnBinding = serde_json::from_str(r#"{"index":3,"field":"Amount"}"#).unwrap();
        assert_eq!(binding, ColumnBinding::new(3, "Amount"));
    }
}
