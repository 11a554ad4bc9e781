//! Row cleanup filters for parsed tables.
//!
//! Exported spreadsheets are rarely clean: title blocks above the data, sum
//! rows below it, blank separator lines, letter spaced headings. A
//! [`RowModifier`] rewrites the raw rows before they are read. An empty row
//! (`Vec::new()`) stands for a blanked row that keeps its position.
//!
//! Modifiers have stable names so a [`ModifierList`] can be stored in a
//! config file as a list of strings.
//!
//! ## Examples
//!
//! ```rust
//! use structtable::modifier::ModifierList;
//!
//! let list: ModifierList = serde_json::from_str(r#"["RemoveEmptyRows", "RemoveTopRow"]"#).unwrap();
//! let rows = vec![
//!     vec!["Report".to_string()],
//!     vec![],
//!     vec!["a".to_string(), "b".to_string()],
//! ];
//! assert_eq!(list.modify(rows), vec![vec!["a", "b"]]);
//! ```

use crate::error::{Error, Result};
use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type Rows = Vec<Vec<String>>;

/// A named transformation of raw rows.
pub trait RowModifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn modify(&self, rows: Rows) -> Rows;
}

fn is_empty_row(row: &[String]) -> bool {
    row.iter().all(String::is_empty)
}

macro_rules! modifiers {
    ($($(#[$doc:meta])* $ty:ident => $name:literal, |$rows:ident| $body:expr;)*) => {
        $(
            $(#[$doc])*
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
            pub struct $ty;

            impl RowModifier for $ty {
                fn name(&self) -> &'static str {
                    $name
                }

                fn modify(&self, $rows: Rows) -> Rows {
                    $body
                }
            }
        )*

        /// Looks up a built-in modifier by its name.
        #[must_use]
        pub fn modifier_by_name(name: &str) -> Option<Arc<dyn RowModifier>> {
            match name {
                $($name => Some(Arc::new($ty)),)*
                _ => None,
            }
        }

        /// Names of all built-in modifiers.
        pub const MODIFIER_NAMES: &[&str] = &[$($name),*];
    };
}

modifiers! {
    /// Blanks rows whose cell count differs from the most common count of
    /// rows with more than one cell. Ties go to the larger count.
    SetRowsWithNonUniformColumnsNil => "SetRowsWithNonUniformColumnsNil", |rows| set_rows_with_non_uniform_columns_nil(rows);
    /// Blanks rows whose cells are all empty.
    SetEmptyRowsNil => "SetEmptyRowsNil", |rows| {
        rows.into_iter()
            .map(|row| if is_empty_row(&row) { Vec::new() } else { row })
            .collect()
    };
    /// Drops rows whose cells are all empty.
    RemoveEmptyRows => "RemoveEmptyRows", |rows| rows.into_iter().filter(|row| !is_empty_row(row)).collect();
    /// Turns letter spaced cells like `"T o t a l"` into `"Total"`.
    CompactSpacedStrings => "CompactSpacedStrings", |rows| {
        rows.into_iter()
            .map(|row| row.into_iter().map(|cell| compact_spaced_string(&cell).unwrap_or(cell)).collect())
            .collect()
    };
    /// Drops the first row. Fewer than two rows leave nothing.
    RemoveTopRow => "RemoveTopRow", |rows| {
        if rows.len() < 2 {
            return Vec::new();
        }
        rows.into_iter().skip(1).collect()
    };
    /// Drops the last row. Fewer than two rows leave nothing.
    RemoveBottomRow => "RemoveBottomRow", |rows| {
        let mut rows = rows;
        if rows.len() < 2 {
            return Vec::new();
        }
        rows.pop();
        rows
    };
    SetTopRowNil => "SetTopRowNil", |rows| {
        let mut rows = rows;
        if let Some(first) = rows.first_mut() {
            first.clear();
        }
        rows
    };
    SetBottomRowNil => "SetBottomRowNil", |rows| {
        let mut rows = rows;
        if let Some(last) = rows.last_mut() {
            last.clear();
        }
        rows
    };
    ReplaceNewlineWithSpace => "ReplaceNewlineWithSpace", |rows| {
        rows.into_iter()
            .map(|row| row.into_iter().map(|cell| cell.replace('\n', " ")).collect())
            .collect()
    };
}

fn set_rows_with_non_uniform_columns_nil(rows: Rows) -> Rows {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for row in rows.iter().filter(|row| row.len() > 1) {
        *counts.entry(row.len()).or_default() += 1;
    }
    let majority = counts
        .into_iter()
        .max_by_key(|&(columns, rows)| (rows, columns))
        .map_or(0, |(columns, _)| columns);

    rows.into_iter()
        .map(|row| if row.len() == majority { row } else { Vec::new() })
        .collect()
}

/// Removes the spaces of a cell whose every second character is a space.
fn compact_spaced_string(cell: &str) -> Option<String> {
    let chars: Vec<char> = cell.chars().collect();
    if chars.len() < 3 {
        return None;
    }
    if chars.iter().skip(1).step_by(2).any(|&c| c != ' ') {
        return None;
    }
    Some(chars.into_iter().step_by(2).collect())
}

/// Modifiers applied in order.
#[derive(Clone, Default)]
pub struct ModifierList(Vec<Arc<dyn RowModifier>>);

impl ModifierList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<M: RowModifier + 'static>(mut self, modifier: M) -> Self {
        self.0.push(Arc::new(modifier));
        self
    }

    /// Builds a list from modifier names.
    ///
    /// # Errors
    ///
    /// Fails on the first unknown name.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                modifier_by_name(name)
                    .ok_or_else(|| Error::custom(format!("unknown row modifier {:?}", name)))
            })
            .collect::<Result<Vec<_>>>()
            .map(ModifierList)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(|m| m.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn modify(&self, rows: Rows) -> Rows {
        self.0.iter().fold(rows, |rows, modifier| modifier.modify(rows))
    }
}

impl fmt::Debug for ModifierList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModifierList").field(&self.names()).finish()
    }
}

impl Serialize for ModifierList {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for modifier in &self.0 {
            seq.serialize_element(modifier.name())?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for ModifierList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        ModifierList::from_names(&names).map_err(serde::de::Error::custom)
    }
}
