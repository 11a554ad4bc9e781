//! Error types for table rendering and reading.
//!
//! Every failure aborts the whole operation it occurred in: a read never
//! assigns a partially filled output and a render never emits a half table
//! on purpose. Errors carry enough context to locate the offending cell.
//!
//! ## Error Categories
//!
//! - **Schema contract**: the destination or source type is not a record
//! - **Bounds**: a row or column index outside the source table
//! - **Scan**: a cell that cannot be parsed into its destination field,
//!   wrapping the underlying [`Error::Parse`] with row and column
//! - **Unmapped field**: a column binding names a field the record does not have
//! - **Unfilled field**: an unbound field whose type rejects the zero value
//! - **I/O**: backend write failures, propagated with their message
//!
//! ## Examples
//!
//! ```rust
//! use structtable::{scan, Error, FormatConfig};
//!
//! let result: Result<i32, Error> = scan("twelve", &FormatConfig::new());
//! assert!(matches!(result, Err(Error::Parse { .. })));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors of the mapping and coercion engine.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error while writing to or reading from a backend
    #[error("IO error: {0}")]
    Io(String),

    /// The type handed to a driver is not a record (struct-like aggregate)
    #[error("schema contract violation: {0}")]
    SchemaContract(String),

    /// Row index outside `[0, len)`
    #[error("row index {index} out of range [0, {len})")]
    RowOutOfBounds { index: usize, len: usize },

    /// Column index outside the cells of one row
    #[error("row {row}: column index {column} out of range [0, {len})")]
    ColumnOutOfBounds { row: usize, column: usize, len: usize },

    /// A cell string that is not a valid value of the expected type
    #[error("cannot parse {value:?} as {expected}")]
    Parse { expected: String, value: String },

    /// A failed cell scan with its table position
    #[error("error reading row {row}, column {column} from {value:?}: {source}")]
    Scan {
        row: usize,
        column: usize,
        value: String,
        source: Box<Error>,
    },

    /// A column binding names a field the record does not declare
    #[error("no field {field:?} found in {record} using tag {tag:?}")]
    UnmappedField {
        field: String,
        record: String,
        tag: String,
    },

    /// An unbound field whose type has no zero value
    #[error("row {row}: unbound field {field:?} has no zero value: {source}")]
    Unfilled {
        row: usize,
        field: String,
        source: Box<Error>,
    },

    /// Operation not allowed in the current renderer state
    #[error("invalid renderer state: {0}")]
    InvalidState(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a parse error for a cell that is not a valid `expected`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use structtable::Error;
    ///
    /// let err = Error::parse("integer", "abc");
    /// assert_eq!(err.to_string(), "cannot parse \"abc\" as integer");
    /// ```
    pub fn parse(expected: &str, value: &str) -> Self {
        Error::Parse {
            expected: expected.to_string(),
            value: value.to_string(),
        }
    }

    /// Wraps a cell error with the position it happened at.
    ///
    /// Errors that already carry a position are returned unchanged so that
    /// nested records do not stack context twice.
    pub fn scan(row: usize, column: usize, value: &str, source: Error) -> Self {
        match source {
            Error::Scan { .. } => source,
            other => Error::Scan {
                row,
                column,
                value: value.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Wraps the failure to zero fill the unbound field at `path`.
    pub fn unfilled(row: usize, path: &[&str], source: Error) -> Self {
        match source {
            Error::Unfilled { .. } => source,
            other => Error::Unfilled {
                row,
                field: path.join("."),
                source: Box::new(other),
            },
        }
    }

    /// Creates a schema contract error.
    pub fn schema_contract<T: fmt::Display>(msg: T) -> Self {
        Error::SchemaContract(msg.to_string())
    }

    /// Creates an invalid state error.
    pub fn invalid_state(msg: &str) -> Self {
        Error::InvalidState(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use structtable::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<::csv::Error> for Error {
    fn from(err: ::csv::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
