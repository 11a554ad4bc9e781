//! HTML table backend.
//!
//! Every cell is escaped, so formatted values can never inject markup.
//!
//! ## Examples
//!
//! ```rust
//! use structtable::{HtmlFormat, TableRenderer};
//!
//! let mut renderer = TableRenderer::new(HtmlFormat::new().with_caption("Q1"));
//! renderer.write_header_row(&["Item".to_string()]).unwrap();
//! renderer.write_row(&["<b>".to_string()]).unwrap();
//! let html = String::from_utf8(renderer.into_bytes().unwrap()).unwrap();
//! assert_eq!(
//!     html,
//!     "<table>\n<caption>Q1</caption>\n<tr><th>Item</th></tr>\n<tr><td>&lt;b&gt;</td></tr>\n</table>\n"
//! );
//! ```

use crate::error::Result;
use crate::render::TableFormat;
use quick_xml::escape::escape;
use std::io::Write;

/// HTML writer backend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HtmlFormat {
    class: Option<String>,
    caption: Option<String>,
    /// Inline styles of even and odd rows.
    row_styles: Option<(String, String)>,
    rows: usize,
}

impl HtmlFormat {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// CSS class set on the table, rows and cells.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Alternating inline styles, starting with `even` on the first row.
    #[must_use]
    pub fn with_row_styles(mut self, even: impl Into<String>, odd: impl Into<String>) -> Self {
        self.row_styles = Some((even.into(), odd.into()));
        self
    }

    fn class_attr(&self) -> String {
        match &self.class {
            Some(class) => format!(" class=\"{}\"", escape(class.as_str())),
            None => String::new(),
        }
    }

    fn write_row(&mut self, sink: &mut dyn Write, cells: &[String], tag: &str) -> Result<()> {
        let class = self.class_attr();
        let style = match &self.row_styles {
            Some((even, odd)) => {
                let style = if self.rows % 2 == 0 { even } else { odd };
                format!(" style=\"{}\"", escape(style.as_str()))
            }
            None => String::new(),
        };
        write!(sink, "<tr{}{}>", class, style)?;
        for cell in cells {
            write!(sink, "<{tag}{class}>{}</{tag}>", escape(cell.as_str()))?;
        }
        sink.write_all(b"</tr>\n")?;
        self.rows += 1;
        Ok(())
    }
}

impl TableFormat for HtmlFormat {
    fn begin_table(&mut self, sink: &mut dyn Write) -> Result<()> {
        self.rows = 0;
        writeln!(sink, "<table{}>", self.class_attr())?;
        if let Some(caption) = &self.caption {
            writeln!(sink, "<caption>{}</caption>", escape(caption.as_str()))?;
        }
        Ok(())
    }

    fn header_row(&mut self, sink: &mut dyn Write, titles: &[String]) -> Result<()> {
        self.write_row(sink, titles, "th")
    }

    fn data_row(&mut self, sink: &mut dyn Write, fields: &[String]) -> Result<()> {
        self.write_row(sink, fields, "td")
    }

    fn end_table(&mut self, sink: &mut dyn Write) -> Result<()> {
        sink.write_all(b"</table>\n")?;
        Ok(())
    }

    fn mime_type(&self) -> &'static str {
        "text/html; charset=UTF-8"
    }
}
