//! Table rendering driver.
//!
//! A [`TableRenderer`] owns a byte buffer and a [`TableFormat`] backend and
//! walks the state machine
//!
//! ```text
//! NotStarted -> HeaderWritten -> RowsWritten -> Finalized
//! ```
//!
//! The backend's `begin_table` hook runs lazily on the first header or row,
//! `end_table` runs exactly once when the result is first requested. Asking
//! for the result again returns the same buffer without touching the backend.
//!
//! ## Examples
//!
//! ```rust
//! use structtable::{CsvFormat, TableRenderer};
//!
//! let mut renderer = TableRenderer::new(CsvFormat::new().with_bom(false));
//! renderer.write_header_row(&["a".to_string(), "b".to_string()]).unwrap();
//! renderer.write_row(&["1".to_string(), "x;y".to_string()]).unwrap();
//! assert_eq!(renderer.result().unwrap(), b"a;b\r\n1;\"x;y\"\r\n");
//! ```

use crate::error::{Error, Result};
use crate::format::format_value;
use crate::mapper::ColumnMapper;
use crate::options::FormatConfig;
use crate::schema::{field_values, flat_schema, Record};
use crate::value::Value;
use std::io::Write;

/// Output backend of a [`TableRenderer`].
///
/// The renderer calls the hooks in strict order: `begin_table` once,
/// `header_row` zero or more times, `data_row` once per row, `end_table`
/// once. Cells arrive fully formatted; escaping and quoting are the
/// backend's job.
pub trait TableFormat {
    fn begin_table(&mut self, sink: &mut dyn Write) -> Result<()>;

    fn header_row(&mut self, sink: &mut dyn Write, titles: &[String]) -> Result<()>;

    fn data_row(&mut self, sink: &mut dyn Write, fields: &[String]) -> Result<()>;

    fn end_table(&mut self, sink: &mut dyn Write) -> Result<()>;

    fn mime_type(&self) -> &'static str {
        "text/plain; charset=UTF-8"
    }
}

impl<F: TableFormat + ?Sized> TableFormat for Box<F> {
    fn begin_table(&mut self, sink: &mut dyn Write) -> Result<()> {
        (**self).begin_table(sink)
    }

    fn header_row(&mut self, sink: &mut dyn Write, titles: &[String]) -> Result<()> {
        (**self).header_row(sink, titles)
    }

    fn data_row(&mut self, sink: &mut dyn Write, fields: &[String]) -> Result<()> {
        (**self).data_row(sink, fields)
    }

    fn end_table(&mut self, sink: &mut dyn Write) -> Result<()> {
        (**self).end_table(sink)
    }

    fn mime_type(&self) -> &'static str {
        (**self).mime_type()
    }
}

/// Progress of a [`TableRenderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderState {
    NotStarted,
    /// The table was begun, header rows may still follow.
    HeaderWritten,
    RowsWritten,
    Finalized,
}

/// Drives a [`TableFormat`] over an in-memory buffer.
///
/// One renderer produces one table. It is not meant to be shared between
/// threads; build one per table and share the [`FormatConfig`] instead.
pub struct TableRenderer<F> {
    format: F,
    config: FormatConfig,
    buf: Vec<u8>,
    state: RenderState,
    rows: usize,
}

impl<F: TableFormat> TableRenderer<F> {
    /// Creates a renderer with [`FormatConfig::new`].
    #[must_use]
    pub fn new(format: F) -> Self {
        TableRenderer {
            format,
            config: FormatConfig::new(),
            buf: Vec::with_capacity(1024),
            state: RenderState::NotStarted,
            rows: 0,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: FormatConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn state(&self) -> RenderState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    #[must_use]
    pub fn format(&self) -> &F {
        &self.format
    }

    /// Number of data rows written so far.
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    fn begin(&mut self) -> Result<()> {
        match self.state {
            RenderState::NotStarted => {
                self.format.begin_table(&mut self.buf)?;
                self.state = RenderState::HeaderWritten;
                Ok(())
            }
            RenderState::Finalized => Err(Error::invalid_state("table is already finalized")),
            RenderState::HeaderWritten | RenderState::RowsWritten => Ok(()),
        }
    }

    /// Writes a header row. Only valid before the first data row.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] after data rows or after finalization,
    /// otherwise backend errors.
    pub fn write_header_row(&mut self, titles: &[String]) -> Result<()> {
        if self.state == RenderState::RowsWritten {
            return Err(Error::invalid_state("header row after data rows"));
        }
        self.begin()?;
        self.format.header_row(&mut self.buf, titles)
    }

    /// Writes one row of already formatted cells.
    pub fn write_row(&mut self, fields: &[String]) -> Result<()> {
        self.begin()?;
        self.format.data_row(&mut self.buf, fields)?;
        self.state = RenderState::RowsWritten;
        self.rows += 1;
        Ok(())
    }

    /// Formats `values` with the renderer's config and writes them as a row.
    pub fn write_values(&mut self, values: &[Value]) -> Result<()> {
        let fields: Vec<String> = values
            .iter()
            .map(|value| format_value(value, &self.config))
            .collect();
        self.write_row(&fields)
    }

    /// Writes `records` as rows laid out by `mapper`, preceded by the
    /// mapper's titles if `header` is set and the mapper produces any.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaContract`] if a record does not serialize as a struct,
    /// otherwise state and backend errors.
    pub fn write_records<T>(&mut self, records: &[T], header: bool, mapper: &dyn ColumnMapper) -> Result<()>
    where
        T: Record + 'static,
    {
        let flat = flat_schema::<T>();
        let mapping = mapper.map_columns(&flat.fields);

        if header && !mapping.titles().is_empty() {
            self.write_header_row(mapping.titles())?;
        } else {
            self.begin()?;
        }
        for record in records {
            let values = field_values(&flat.fields, record)?;
            self.write_values(&mapping.reflect(values))?;
        }
        Ok(())
    }

    /// Finalizes the table and returns the rendered bytes.
    ///
    /// The first call runs the backend's `end_table` hook (and `begin_table`
    /// if nothing was written yet). Later calls return the same bytes.
    pub fn result(&mut self) -> Result<&[u8]> {
        if self.state != RenderState::Finalized {
            self.begin()?;
            self.format.end_table(&mut self.buf)?;
            self.state = RenderState::Finalized;
            tracing::debug!(
                rows = self.rows,
                bytes = self.buf.len(),
                mime_type = self.format.mime_type(),
                "table finalized"
            );
        }
        Ok(&self.buf)
    }

    /// Finalizes the table and returns the buffer.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        self.result()?;
        Ok(self.buf)
    }

    /// Finalizes the table and copies the rendered bytes to `writer`.
    pub fn write_result_to<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        let bytes = self.result()?;
        writer.write_all(bytes)?;
        Ok(())
    }
}
