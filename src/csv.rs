//! Delimited text backend.
//!
//! [`CsvFormat`] writes tables for spreadsheet import: a UTF-8 byte order
//! mark, `;` as delimiter and `\r\n` line ends by default. Quoting and quote
//! doubling are done by the `csv` crate.
//!
//! The reading side parses raw text into string rows for a
//! [`TableReader`](crate::TableReader), either with a known [`CsvDialect`]
//! or one guessed by [`detect_dialect`].
//!
//! ## Examples
//!
//! ```rust
//! use structtable::csv::{detect_dialect, parse_rows};
//!
//! let text = "name,age\nAnn,30\n\"Bo, Jr.\",41\n";
//! let dialect = detect_dialect(text);
//! assert_eq!(dialect.delimiter, ',');
//! assert_eq!(dialect.newline, "\n");
//!
//! let rows = parse_rows(text, &dialect).unwrap();
//! assert_eq!(rows[2], vec!["Bo, Jr.", "41"]);
//! ```

use crate::error::{Error, Result};
use crate::render::TableFormat;
use serde::{Deserialize, Serialize};
use std::io::Write;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// When the writer quotes a field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteStyle {
    /// Only fields containing the delimiter, a quote or a line break.
    #[default]
    Necessary,
    Always,
    /// Every field that does not parse as a number.
    NonNumeric,
    Never,
}

impl From<QuoteStyle> for ::csv::QuoteStyle {
    fn from(style: QuoteStyle) -> Self {
        match style {
            QuoteStyle::Necessary => ::csv::QuoteStyle::Necessary,
            QuoteStyle::Always => ::csv::QuoteStyle::Always,
            QuoteStyle::NonNumeric => ::csv::QuoteStyle::NonNumeric,
            QuoteStyle::Never => ::csv::QuoteStyle::Never,
        }
    }
}

/// CSV writer backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvFormat {
    delimiter: u8,
    newline: String,
    bom: bool,
    quote_style: QuoteStyle,
    header_comment: Option<String>,
}

impl Default for CsvFormat {
    fn default() -> Self {
        CsvFormat {
            delimiter: b';',
            newline: "\r\n".to_string(),
            bom: true,
            quote_style: QuoteStyle::Necessary,
            header_comment: None,
        }
    }
}

impl CsvFormat {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_newline(mut self, newline: impl Into<String>) -> Self {
        self.newline = newline.into();
        self
    }

    /// Takes delimiter and newline from a dialect.
    ///
    /// # Errors
    ///
    /// Fails if the dialect does not validate.
    pub fn with_dialect(self, dialect: &CsvDialect) -> Result<Self> {
        dialect.validate()?;
        Ok(self
            .with_delimiter(dialect.delimiter as u8)
            .with_newline(dialect.newline.clone()))
    }

    #[must_use]
    pub fn with_bom(mut self, bom: bool) -> Self {
        self.bom = bom;
        self
    }

    #[must_use]
    pub fn with_quote_style(mut self, quote_style: QuoteStyle) -> Self {
        self.quote_style = quote_style;
        self
    }

    /// Line written before the header row. An empty comment disables it.
    #[must_use]
    pub fn with_header_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        self.header_comment = (!comment.is_empty()).then_some(comment);
        self
    }

    #[must_use]
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    #[must_use]
    pub fn newline(&self) -> &str {
        &self.newline
    }

    fn write_record(&self, sink: &mut dyn Write, fields: &[String]) -> Result<()> {
        // the csv writer gets a one byte terminator that is swapped for the
        // configured newline, which may be two bytes in either order
        let mut line = Vec::with_capacity(fields.iter().map(String::len).sum::<usize>() + fields.len() + 2);
        {
            let mut writer = ::csv::WriterBuilder::new()
                .delimiter(self.delimiter)
                .quote_style(self.quote_style.into())
                .terminator(::csv::Terminator::Any(b'\n'))
                .has_headers(false)
                .flexible(true)
                .from_writer(&mut line);
            writer.write_record(fields)?;
            writer.flush()?;
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        sink.write_all(&line)?;
        sink.write_all(self.newline.as_bytes())?;
        Ok(())
    }
}

impl TableFormat for CsvFormat {
    fn begin_table(&mut self, sink: &mut dyn Write) -> Result<()> {
        if self.bom {
            sink.write_all(UTF8_BOM)?;
        }
        Ok(())
    }

    fn header_row(&mut self, sink: &mut dyn Write, titles: &[String]) -> Result<()> {
        if let Some(comment) = &self.header_comment {
            sink.write_all(comment.as_bytes())?;
            sink.write_all(self.newline.as_bytes())?;
        }
        self.write_record(sink, titles)
    }

    fn data_row(&mut self, sink: &mut dyn Write, fields: &[String]) -> Result<()> {
        self.write_record(sink, fields)
    }

    fn end_table(&mut self, _sink: &mut dyn Write) -> Result<()> {
        Ok(())
    }

    fn mime_type(&self) -> &'static str {
        "text/csv; charset=UTF-8"
    }
}

/// Delimiter and line end of a CSV text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvDialect {
    pub delimiter: char,
    pub newline: String,
}

impl Default for CsvDialect {
    fn default() -> Self {
        CsvDialect::new(',')
    }
}

impl CsvDialect {
    /// A dialect with `\r\n` line ends.
    #[must_use]
    pub fn new(delimiter: char) -> Self {
        CsvDialect {
            delimiter,
            newline: "\r\n".to_string(),
        }
    }

    /// Checks for a single byte delimiter and a known line end.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use structtable::csv::CsvDialect;
    ///
    /// assert!(CsvDialect::new(';').validate().is_ok());
    /// assert!(CsvDialect::new('§').validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() || matches!(self.delimiter, '"' | '\r' | '\n') {
            return Err(Error::custom(format!(
                "invalid CSV delimiter {:?}",
                self.delimiter
            )));
        }
        match self.newline.as_str() {
            "\n" | "\r\n" | "\n\r" | "\r" => Ok(()),
            "" => Err(Error::custom("missing CSV newline")),
            other => Err(Error::custom(format!("invalid CSV newline {:?}", other))),
        }
    }
}

/// Guesses the dialect of `text`.
///
/// The line end is the most frequent of `\r`, `\n` and `\r\n`; the delimiter
/// is whichever of `,`, `;` and tab occurs strictly most often on non-empty
/// lines, `,` otherwise.
#[must_use]
pub fn detect_dialect(text: &str) -> CsvDialect {
    let count_r = text.matches('\r').count();
    let count_n = text.matches('\n').count();
    let count_rn = text.matches("\r\n").count();
    let newline = if count_r > count_n {
        "\r"
    } else if count_n > count_rn {
        "\n"
    } else {
        "\r\n"
    };

    let (mut commas, mut semicolons, mut tabs) = (0usize, 0usize, 0usize);
    for line in text.split(newline) {
        let line = line.trim_matches(|c| c == '\r' || c == '\n');
        for c in line.chars() {
            match c {
                ',' => commas += 1,
                ';' => semicolons += 1,
                '\t' => tabs += 1,
                _ => {}
            }
        }
    }
    let delimiter = if semicolons > commas && semicolons > tabs {
        ';'
    } else if tabs > commas && tabs > semicolons {
        '\t'
    } else {
        ','
    };

    tracing::debug!(?delimiter, ?newline, "detected CSV dialect");
    CsvDialect {
        delimiter,
        newline: newline.to_string(),
    }
}

/// Splits `text` into rows of cells.
///
/// A leading byte order mark is skipped, rows may have different lengths
/// and blank lines produce no row. Any line end is accepted.
pub fn parse_rows(text: &str, dialect: &CsvDialect) -> Result<Vec<Vec<String>>> {
    dialect.validate()?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(dialect.delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .terminator(::csv::Terminator::CRLF)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// [`detect_dialect`] followed by [`parse_rows`].
pub fn parse_rows_detect(text: &str) -> Result<(Vec<Vec<String>>, CsvDialect)> {
    let dialect = detect_dialect(text.strip_prefix('\u{feff}').unwrap_or(text));
    let rows = parse_rows(text, &dialect)?;
    Ok((rows, dialect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::TableRenderer;

    fn render(format: CsvFormat, header: &[&str], rows: &[&[&str]]) -> String {
        let mut renderer = TableRenderer::new(format);
        let header: Vec<String> = header.iter().map(|s| s.to_string()).collect();
        renderer.write_header_row(&header).unwrap();
        for row in rows {
            let row: Vec<String> = row.iter().map(|s| s.to_string()).collect();
            renderer.write_row(&row).unwrap();
        }
        String::from_utf8(renderer.into_bytes().unwrap()).unwrap()
    }

    #[test]
    fn test_default_has_bom_and_semicolons() {
        let out = render(CsvFormat::new(), &["a", "b"], &[&["1", "2"]]);
        assert_eq!(out, "\u{feff}a;b\r\n1;2\r\n");
    }

    #[test]
    fn test_quoting() {
        let format = CsvFormat::new().with_bom(false).with_delimiter(b',').with_newline("\n");
        let out = render(format, &["x"], &[&["say \"hi\""], &["a,b"], &["line\nbreak"]]);
        assert_eq!(out, "x\n\"say \"\"hi\"\"\"\n\"a,b\"\n\"line\nbreak\"\n");

        let always = CsvFormat::new()
            .with_bom(false)
            .with_quote_style(QuoteStyle::Always);
        assert_eq!(render(always, &["a"], &[&["1"]]), "\"a\"\r\n\"1\"\r\n");
    }

    #[test]
    fn test_header_comment() {
        let format = CsvFormat::new()
            .with_bom(false)
            .with_header_comment("# export")
            .with_newline("\n");
        assert_eq!(render(format, &["a"], &[]), "# export\na\n");
    }

    #[test]
    fn test_dialect_validation() {
        assert!(CsvDialect::new('\t').validate().is_ok());
        assert!(CsvDialect::new('"').validate().is_err());
        let bad = CsvDialect {
            delimiter: ',',
            newline: "\t".to_string(),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_detect_dialect() {
        assert_eq!(detect_dialect("a;b;c\r\n1;2;3\r\n"), CsvDialect::new(';'));
        let tabs = detect_dialect("a\tb\n1\t2\n");
        assert_eq!((tabs.delimiter, tabs.newline.as_str()), ('\t', "\n"));
        assert_eq!(detect_dialect("").delimiter, ',');
    }

    #[test]
    fn test_parse_rows_flexible() {
        let rows = parse_rows("\u{feff}a;b\r\n\r\n1;2;3\r\n", &CsvDialect::new(';')).unwrap();
        assert_eq!(rows, vec![vec!["a", "b"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn test_dialect_serde() {
        let json = serde_json::to_string(&CsvDialect::new(';')).unwrap();
        assert_eq!(json, r#"{"delimiter":";","newline":"\r\n"}"#);
    }
}
