//! Column titles and field-to-column assignment.
//!
//! A [`ColumnMapper`] looks at the flattened fields of a record and returns a
//! [`ColumnMapping`]: the header titles plus, per field, the column it lands
//! in (or none if it is ignored). The mapping is a pure function of the field
//! list and the mapper configuration.
//!
//! [`ReflectColumnTitles`] is the configurable mapper:
//!
//! 1. A field's title is its annotation in the mapper's tag namespace
//!    (trimmed at the first `,`), otherwise the untagged-title transform of
//!    its name, [`space_pascal_case`] by default.
//! 2. A title equal to the ignore sentinel (`-`) removes the field.
//! 3. Remaining fields get the next free column in declaration order. An
//!    explicit remap is honoured when its target is in range and not yet
//!    taken, otherwise the field falls back to the next free column.
//!
//! ## Examples
//!
//! ```rust
//! use structtable::{ColumnMapper, FieldDescriptor, ReflectColumnTitles};
//!
//! let fields: Vec<FieldDescriptor> = ["UserID", "first_name", "secret"]
//!     .iter()
//!     .map(|name| FieldDescriptor { name, path: vec![name], tags: vec![] })
//!     .collect();
//!
//! let mapper = ReflectColumnTitles::new().with_ignore_index(2).with_map_index(0, 1);
//! let mapping = mapper.map_columns(&fields);
//! assert_eq!(mapping.titles(), ["first name", "User ID"]);
//! assert_eq!(mapping.column_of(0), Some(1));
//! assert_eq!(mapping.column_of(2), None);
//! ```

use crate::schema::{FieldDescriptor, DEFAULT_IGNORE_TITLE, DEFAULT_TAG};
use crate::value::Value;
use std::collections::BTreeMap;

/// Computes titles and column positions for flattened fields.
pub trait ColumnMapper {
    fn map_columns(&self, fields: &[FieldDescriptor]) -> ColumnMapping;
}

impl<M: ColumnMapper + ?Sized> ColumnMapper for &M {
    fn map_columns(&self, fields: &[FieldDescriptor]) -> ColumnMapping {
        (**self).map_columns(fields)
    }
}

/// Result of a [`ColumnMapper`]: titles and the field reflector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMapping {
    titles: Vec<String>,
    columns: Vec<Option<usize>>,
    num_columns: usize,
}

impl ColumnMapping {
    /// Every field in its own column, in declaration order.
    #[must_use]
    pub fn identity(num_fields: usize, titles: Vec<String>) -> Self {
        ColumnMapping {
            titles,
            columns: (0..num_fields).map(Some).collect(),
            num_columns: num_fields,
        }
    }

    /// Header titles by column. Empty when the mapper produces no header.
    #[must_use]
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Column of the field at `field_index`, `None` if ignored.
    #[must_use]
    pub fn column_of(&self, field_index: usize) -> Option<usize> {
        self.columns.get(field_index).copied().flatten()
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Moves field values (in flattened field order) to their columns.
    ///
    /// Ignored fields are dropped. Columns without a source value stay
    /// [`Value::Null`].
    #[must_use]
    pub fn reflect(&self, values: Vec<Value>) -> Vec<Value> {
        let mut row = vec![Value::Null; self.num_columns];
        for (field_index, value) in values.into_iter().enumerate() {
            if let Some(slot) = self.column_of(field_index).and_then(|c| row.get_mut(c)) {
                *slot = value;
            }
        }
        row
    }
}

/// Requested placement of one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnTarget {
    Column(usize),
    Ignore,
}

/// Titles from field annotations or names, with optional remapping.
#[derive(Clone, Debug)]
pub struct ReflectColumnTitles {
    /// Namespace of the title annotation.
    pub tag: String,
    pub ignore_title: String,
    /// Title of fields without annotation; `None` uses the field name as is.
    pub untagged_field_title: Option<fn(&str) -> String>,
    /// Flattened field index to requested placement.
    pub map_indices: BTreeMap<usize, ColumnTarget>,
}

impl Default for ReflectColumnTitles {
    fn default() -> Self {
        ReflectColumnTitles {
            tag: DEFAULT_TAG.to_string(),
            ignore_title: DEFAULT_IGNORE_TITLE.to_string(),
            untagged_field_title: Some(space_pascal_case),
            map_indices: BTreeMap::new(),
        }
    }
}

impl ReflectColumnTitles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    #[must_use]
    pub fn with_ignore_title(mut self, ignore_title: impl Into<String>) -> Self {
        self.ignore_title = ignore_title.into();
        self
    }

    #[must_use]
    pub fn with_untagged_field_title(mut self, transform: Option<fn(&str) -> String>) -> Self {
        self.untagged_field_title = transform;
        self
    }

    /// Requests column `column` for the field at `field_index`.
    #[must_use]
    pub fn with_map_index(mut self, field_index: usize, column: usize) -> Self {
        self.map_indices
            .insert(field_index, ColumnTarget::Column(column));
        self
    }

    /// Removes the field at `field_index` from the table.
    #[must_use]
    pub fn with_ignore_index(mut self, field_index: usize) -> Self {
        self.map_indices.insert(field_index, ColumnTarget::Ignore);
        self
    }

    /// Replaces the whole remap table.
    #[must_use]
    pub fn with_map_indices(mut self, map_indices: BTreeMap<usize, ColumnTarget>) -> Self {
        self.map_indices = map_indices;
        self
    }

    fn title_of(&self, field: &FieldDescriptor) -> String {
        if let Some(title) = field.title(&self.tag) {
            return title.to_string();
        }
        match self.untagged_field_title {
            Some(transform) => transform(field.name),
            None => field.name.to_string(),
        }
    }
}

impl ColumnMapper for ReflectColumnTitles {
    fn map_columns(&self, fields: &[FieldDescriptor]) -> ColumnMapping {
        let titles: Vec<Option<String>> = fields
            .iter()
            .enumerate()
            .map(|(index, field)| {
                if self.map_indices.get(&index) == Some(&ColumnTarget::Ignore) {
                    return None;
                }
                let title = self.title_of(field);
                (title != self.ignore_title).then_some(title)
            })
            .collect();

        let num_columns = titles.iter().filter(|t| t.is_some()).count();
        let mut used = vec![false; num_columns];
        let mut columns = vec![None; fields.len()];
        let mut column_titles = vec![String::new(); num_columns];

        for (index, title) in titles.into_iter().enumerate() {
            let Some(title) = title else { continue };
            let requested = match self.map_indices.get(&index) {
                Some(ColumnTarget::Column(c)) => Some(*c),
                _ => None,
            };
            let column = match requested {
                Some(c) if c < num_columns && !used[c] => c,
                _ => {
                    let Some(free) = used.iter().position(|u| !u) else {
                        continue;
                    };
                    if let Some(c) = requested {
                        tracing::debug!(
                            field = fields[index].name,
                            requested = c,
                            assigned = free,
                            "column remap unavailable, using next free column"
                        );
                    }
                    free
                }
            };
            used[column] = true;
            columns[index] = Some(column);
            column_titles[column] = title;
        }

        ColumnMapping {
            titles: column_titles,
            columns,
            num_columns,
        }
    }
}

/// Fixed titles, every field in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnTitles(pub Vec<String>);

impl ColumnMapper for ColumnTitles {
    fn map_columns(&self, fields: &[FieldDescriptor]) -> ColumnMapping {
        ColumnMapping::identity(fields.len(), self.0.clone())
    }
}

/// No header, every field in declaration order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoColumnTitles;

impl ColumnMapper for NoColumnTitles {
    fn map_columns(&self, fields: &[FieldDescriptor]) -> ColumnMapping {
        ColumnMapping::identity(fields.len(), Vec::new())
    }
}

/// Spaces out a `PascalCase` or `snake_case` name.
///
/// A space goes before every upper case letter that follows a lower case
/// one, underscores become single spaces, and the result is trimmed.
///
/// # Examples
///
/// ```rust
/// use structtable::space_pascal_case;
///
/// assert_eq!(space_pascal_case("HelloWorld"), "Hello World");
/// assert_eq!(space_pascal_case("UserID"), "User ID");
/// assert_eq!(space_pascal_case("first_name"), "first name");
/// ```
#[must_use]
pub fn space_pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut last_was_upper = true;
    let mut last_was_space = true;
    for c in name.chars() {
        if c == '_' {
            if !last_was_space {
                out.push(' ');
            }
            last_was_upper = false;
            last_was_space = true;
            continue;
        }

        let is_upper = c.is_uppercase();
        if is_upper && !last_was_upper && !last_was_space {
            out.push(' ');
        }
        out.push(c);
        last_was_upper = is_upper;
        last_was_space = c.is_whitespace();
    }
    out.trim().to_string()
}
