//! # structtable
//!
//! Column mapping and value coercion between typed records and tables of
//! text cells.
//!
//! ## What does it do?
//!
//! A record type declares its fields once. From that declaration the crate
//! derives column titles, lays fields out in columns, formats every value
//! into a cell string and hands the rows to an output backend (CSV, HTML or
//! your own). The same declaration drives the way back: raw string rows from
//! a parsed file are scanned into fresh records, field by field.
//!
//! ## Key Features
//!
//! - **Serde based**: records are plain `#[derive(Serialize, Deserialize)]`
//!   structs, no runtime type inspection
//! - **Declared titles**: titles, ignored and private fields and embedded
//!   sub-records come from a [`Schema`], written by hand or with [`record!`]
//! - **Configurable coercion**: number separators, precision, boolean and
//!   null tokens, date layouts, all in one [`FormatConfig`] value
//! - **Custom types**: a [`ValueHandler`] registered under a newtype's name
//!   formats, scans and zeroes that type
//! - **All or nothing**: the first failing cell aborts a read with its row,
//!   column and raw text
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use structtable::{from_csv_str, record, to_csv_string};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: u32,
//!     city: String,
//! }
//!
//! record!(Person { name: "Name", age: "Age", city: "City" });
//!
//! let people = vec![
//!     Person { name: "Ann".into(), age: 30, city: "Linz".into() },
//!     Person { name: "Bo".into(), age: 41, city: "Graz".into() },
//! ];
//!
//! let csv = to_csv_string(&people).unwrap();
//! assert_eq!(csv, "Name;Age;City\r\nAnn;30;Linz\r\nBo;41;Graz\r\n");
//!
//! let back: Vec<Person> = from_csv_str(&csv).unwrap();
//! assert_eq!(back, people);
//! ```
//!
//! ### Custom Layouts
//!
//! ```rust
//! use serde::Serialize;
//! use structtable::{record, FormatConfig, HtmlFormat, ReflectColumnTitles, TableRenderer};
//!
//! #[derive(Serialize)]
//! struct Item { sku: String, price: f64, internal_note: String }
//!
//! record!(Item { sku: "SKU", price, internal_note: ignore });
//!
//! let mut renderer = TableRenderer::new(HtmlFormat::new())
//!     .with_config(FormatConfig::german().with_float_precision(Some(2)).with_pad_precision(true));
//! let mapper = ReflectColumnTitles::new().with_map_index(0, 1);
//! let items = [Item { sku: "A-1".into(), price: 1234.5, internal_note: "x".into() }];
//! renderer.write_records(&items, true, &mapper).unwrap();
//!
//! let html = String::from_utf8(renderer.into_bytes().unwrap()).unwrap();
//! assert!(html.contains("<tr><th>price</th><th>SKU</th></tr>"));
//! assert!(html.contains("<tr><td>1234,50</td><td>A-1</td></tr>"));
//! ```
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Row and column indices are bounds-checked and reported as errors
//! - Proper error propagation with `Result` types
//!
//! ## Examples
//!
//! See the `demos/` directory:
//!
//! - **`simple.rs`** - Rendering records to CSV and HTML
//! - **`read_csv.rs`** - Cleaning and reading a messy CSV export
//! - **`custom_handler.rs`** - Registering a handler for an own cell type
//!
//! Run any example with: `cargo run --example <name>`

#[macro_use]
pub mod macros;

pub mod csv;
pub mod de;
pub mod error;
pub mod format;
pub mod html;
pub mod map;
pub mod mapper;
pub mod modifier;
pub mod options;
pub mod reader;
pub mod render;
pub mod schema;
pub mod ser;
pub mod types;
pub mod value;

pub use crate::csv::{CsvDialect, CsvFormat, QuoteStyle};
pub use de::{scan, CellDeserializer, ValueDeserializer, ZeroDeserializer};
pub use error::{Error, Result};
pub use format::{format_value, HandlerRegistry, ValueHandler};
pub use html::HtmlFormat;
pub use map::FieldMap;
pub use mapper::{
    space_pascal_case, ColumnMapper, ColumnMapping, ColumnTarget, ColumnTitles, NoColumnTitles,
    ReflectColumnTitles,
};
pub use modifier::{modifier_by_name, ModifierList, RowModifier};
pub use options::{FloatFormat, FormatConfig, MoneyFormat};
pub use reader::{ColumnBinding, ReadOutput, RowSource, StringRows, TableReader, UnboundFields};
pub use render::{RenderState, TableFormat, TableRenderer};
pub use schema::{
    field_values, flat_schema, flatten, Field, FieldDescriptor, FlatSchema, Record, Schema,
    DEFAULT_IGNORE_TITLE, DEFAULT_TAG,
};
pub use ser::{to_value, ValueSerializer};
pub use value::Value;

use serde::de::DeserializeOwned;
use std::io;

/// Render `records` with a header row, using the default title mapper.
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use structtable::{record, render, CsvFormat, FormatConfig};
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
/// record!(Point { x, y });
///
/// let bytes = render(CsvFormat::new().with_bom(false), &[Point { x: 1, y: 2 }], FormatConfig::new()).unwrap();
/// assert_eq!(bytes, b"x;y\r\n1;2\r\n");
/// ```
///
/// # Errors
///
/// Returns an error if a record does not serialize as a struct or the
/// backend fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn render<T, F>(format: F, records: &[T], config: FormatConfig) -> Result<Vec<u8>>
where
    T: Record + 'static,
    F: TableFormat,
{
    let mut renderer = TableRenderer::new(format).with_config(config);
    renderer.write_records(records, true, &ReflectColumnTitles::default())?;
    renderer.into_bytes()
}

/// Render `records` like [`render`] and write the table to `writer`.
///
/// # Errors
///
/// Returns an error if rendering fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn render_to<W, T, F>(mut writer: W, format: F, records: &[T], config: FormatConfig) -> Result<()>
where
    W: io::Write,
    T: Record + 'static,
    F: TableFormat,
{
    let bytes = render(format, records, config)?;
    writer.write_all(&bytes)?;
    Ok(())
}

/// Render `records` as `;` separated CSV text without byte order mark.
///
/// # Errors
///
/// Returns an error if a record does not serialize as a struct.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_csv_string<T>(records: &[T]) -> Result<String>
where
    T: Record + 'static,
{
    let bytes = render(CsvFormat::new().with_bom(false), records, FormatConfig::new())?;
    String::from_utf8(bytes).map_err(|e| Error::custom(e.to_string()))
}

/// Render `records` as an HTML table.
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use structtable::{record, to_html_string};
///
/// #[derive(Serialize)]
/// struct Tag { label: String }
/// record!(Tag { label: "Label" });
///
/// let html = to_html_string(&[Tag { label: "a<b".into() }]).unwrap();
/// assert_eq!(html, "<table>\n<tr><th>Label</th></tr>\n<tr><td>a&lt;b</td></tr>\n</table>\n");
/// ```
///
/// # Errors
///
/// Returns an error if a record does not serialize as a struct.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_html_string<T>(records: &[T]) -> Result<String>
where
    T: Record + 'static,
{
    let bytes = render(HtmlFormat::new(), records, FormatConfig::new())?;
    String::from_utf8(bytes).map_err(|e| Error::custom(e.to_string()))
}

/// Read records from CSV text whose first row holds the column titles.
///
/// Delimiter and line ends are detected. Header cells are matched against
/// the titles the default mapper derives, so output of [`to_csv_string`]
/// reads back. Columns without a matching title are skipped.
///
/// # Errors
///
/// Returns an error if the text is not valid CSV or a cell does not parse.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_csv_str<T>(text: &str) -> Result<Vec<T>>
where
    T: Record + DeserializeOwned + 'static,
{
    let (rows, _) = crate::csv::parse_rows_detect(text)?;
    let Some(header) = rows.first() else {
        return Ok(Vec::new());
    };

    let flat = flat_schema::<T>();
    let mapping = ReflectColumnTitles::default().map_columns(&flat.fields);
    let bindings: Vec<ColumnBinding> = header
        .iter()
        .enumerate()
        .filter_map(|(column, title)| {
            let field = flat.fields.iter().enumerate().find_map(|(index, field)| {
                let mapped = mapping.column_of(index)?;
                (mapping.titles().get(mapped).map(String::as_str) == Some(title.trim())).then_some(field)
            })?;
            let name = field.title(DEFAULT_TAG).map(str::trim).unwrap_or(field.name);
            Some(ColumnBinding::new(column, name))
        })
        .collect();

    TableReader::new(bindings)
        .read::<T, _>(&rows, 1)
        .map(|out| out.records)
}
