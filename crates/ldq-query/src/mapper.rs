//! Result mapping.
//!
//! Turns directory entries into host values: either one entry bound
//! attribute by attribute to output paths, or all entries collected into
//! an [`OutputTable`] that is optionally sorted on one column.

use std::cmp::Ordering;

use crate::config::{AttributeBinding, QuerySpec, ResultSpec};
use crate::error::QueryResult;
use crate::search::{AttributeValue, DirectoryEntry};
use crate::value::{
    resolve_or_literal, resolve_variable, OutputBinder, Recordset, Value, VariableResolver,
};

// ============================================================================
// Cells and Tables
// ============================================================================

/// One projected value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// The attribute is missing on the entry.
    Absent,
    /// A single value.
    Text(String),
    /// Several values, in directory order.
    List(Vec<String>),
}

impl Cell {
    /// Key used when sorting: the cell's string form, empty when absent.
    #[must_use]
    pub fn sort_key(&self) -> String {
        match self {
            Self::Absent => String::new(),
            Self::Text(s) => s.clone(),
            Self::List(items) => format!("[{}]", items.join(", ")),
        }
    }

    /// Converts to a host value. Absent cells become an empty string.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Absent => Value::Text(String::new()),
            Self::Text(s) => Value::Text(s),
            Self::List(items) => Value::from(items),
        }
    }
}

impl From<AttributeValue<'_>> for Cell {
    fn from(value: AttributeValue<'_>) -> Self {
        match value {
            AttributeValue::Absent => Self::Absent,
            AttributeValue::Single(s) => Self::Text(s.to_string()),
            AttributeValue::Multi(values) => Self::List(values.to_vec()),
        }
    }
}

/// A mapped entry: the entry name (if included) followed by one cell per
/// projected attribute.
pub type ResultRow = Vec<Cell>;

/// Mapped entries with their column headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputTable {
    /// Column headers.
    pub columns: Vec<String>,
    /// Rows, one cell per column.
    pub rows: Vec<ResultRow>,
}

impl OutputTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Returns the index of `name`, or 0 when there is no such column.
    #[must_use]
    pub fn column_index(&self, name: &str) -> usize {
        self.columns.iter().position(|c| c == name).unwrap_or(0)
    }

    /// Appends a row in arrival order.
    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    /// Inserts a row keeping the table ordered on `column`.
    ///
    /// The scan starts at the top and moves past rows that sort before the
    /// new one (after it, when `descending`). Ties stop the scan. A row with
    /// no cell at `column` goes to the top.
    pub fn insert_sorted(&mut self, row: ResultRow, column: usize, descending: bool) {
        let mut at = 0;
        if let Some(key) = row.get(column).map(Cell::sort_key) {
            let keep_scanning = if descending {
                Ordering::Greater
            } else {
                Ordering::Less
            };
            while let Some(existing) = self.rows.get(at) {
                match existing.get(column).map(Cell::sort_key) {
                    Some(existing) if compare_ignore_case(&existing, &key) == keep_scanning => {
                        at += 1;
                    }
                    _ => break,
                }
            }
        }
        self.rows.insert(at, row);
    }

    /// Converts to a host recordset.
    #[must_use]
    pub fn into_recordset(self) -> Recordset {
        Recordset {
            columns: self.columns,
            rows: self
                .rows
                .into_iter()
                .map(|row| row.into_iter().map(Cell::into_value).collect())
                .collect(),
        }
    }

    /// Converts to a list of row lists.
    #[must_use]
    pub fn into_nested_list(self) -> Value {
        Value::List(
            self.rows
                .into_iter()
                .map(|row| Value::List(row.into_iter().map(Cell::into_value).collect()))
                .collect(),
        )
    }

    /// Converts to the representation expected by the current slot value:
    /// a recordset (`Null` when empty) if the slot holds one, a nested list
    /// otherwise.
    #[must_use]
    pub fn into_slot_value(self, current: Option<&Value>) -> Value {
        if current.is_some_and(Value::is_recordset) {
            if self.rows.is_empty() {
                Value::Null
            } else {
                Value::Recordset(self.into_recordset())
            }
        } else {
            self.into_nested_list()
        }
    }
}

/// Compares two strings ignoring case, char by char.
///
/// Each pair of chars is compared after upper-casing and then lower-casing,
/// so letters that only differ in case compare equal.
#[must_use]
pub fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    let mut left = a.chars();
    let mut right = b.chars();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l == r => {}
            (Some(l), Some(r)) => {
                let (l, r) = (fold_case(l), fold_case(r));
                if l != r {
                    return l.cmp(&r);
                }
            }
        }
    }
}

fn fold_case(c: char) -> char {
    let upper = single_char(c.to_uppercase()).unwrap_or(c);
    single_char(upper.to_lowercase()).unwrap_or(upper)
}

fn single_char(mut chars: impl Iterator<Item = char>) -> Option<char> {
    let first = chars.next()?;
    chars.next().is_none().then_some(first)
}

// ============================================================================
// Entry Names
// ============================================================================

/// Formats the entry name reported to the host.
///
/// `/` is escaped, surrounding double quotes are removed and the base
/// object is appended unless it is blank.
#[must_use]
pub fn entry_display_name(name: &str, base_object: &str) -> String {
    let escaped = name.replace('/', "\\/");
    let unquoted = escaped
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .map(str::to_string)
        .unwrap_or(escaped);
    if base_object.trim().is_empty() {
        unquoted
    } else {
        format!("{unquoted},{base_object}")
    }
}

// ============================================================================
// Result Mapper
// ============================================================================

/// Maps entries for one invocation of a query.
#[derive(Debug, Clone, Copy)]
pub struct ResultMapper<'a> {
    spec: &'a QuerySpec,
    base_object: &'a str,
}

impl<'a> ResultMapper<'a> {
    /// Creates a mapper for `spec`, with the resolved base object used in
    /// entry names.
    #[must_use]
    pub const fn new(spec: &'a QuerySpec, base_object: &'a str) -> Self {
        Self { spec, base_object }
    }

    /// Projects one entry onto the table columns.
    #[must_use]
    pub fn map_row(&self, entry: &DirectoryEntry) -> ResultRow {
        let mut row = Vec::new();
        if self.spec.include_entry_name {
            row.push(Cell::Text(entry_display_name(&entry.name, self.base_object)));
        }
        row.extend(
            self.spec
                .projected_attributes()
                .into_iter()
                .map(|attribute| Cell::from(entry.attribute(attribute))),
        );
        row
    }

    /// Builds the (sorted) table of all entries.
    ///
    /// The sort attribute may name a variable holding the column name.
    pub fn build_table<R, I>(&self, entries: I, resolver: &R) -> OutputTable
    where
        R: VariableResolver + ?Sized,
        I: IntoIterator<Item = DirectoryEntry>,
    {
        let mut table = OutputTable::new(self.spec.column_names());
        let sort_column = self
            .spec
            .sort_attribute
            .as_deref()
            .map(|attr| table.column_index(&resolve_or_literal(resolver, attr)));

        for entry in entries {
            let row = self.map_row(&entry);
            match sort_column {
                Some(column) => table.insert_sorted(row, column, self.spec.sort_descending),
                None => table.push(row),
            }
        }
        tracing::debug!(
            rows = table.rows.len(),
            sort_column = ?sort_column,
            descending = self.spec.sort_descending,
            "built result table"
        );
        table
    }

    /// Writes the first entry to the configured output paths.
    ///
    /// The entry-name output, if enabled, is written first. With no entry,
    /// every output is cleared to `Null`.
    ///
    /// ## Errors
    ///
    /// Returns a binding error if an output path cannot be written.
    pub fn bind_first_entry<B>(&self, entry: Option<&DirectoryEntry>, binder: &mut B) -> QueryResult<()>
    where
        B: OutputBinder + ?Sized,
    {
        let bindings: &[AttributeBinding] = match &self.spec.result {
            ResultSpec::SingleRow { bindings } => bindings,
            ResultSpec::MultiRow { .. } => &[],
        };

        if self.spec.include_entry_name {
            let name = entry.map_or(Value::Null, |e| {
                Value::Text(entry_display_name(&e.name, self.base_object))
            });
            binder.set_output(&self.spec.entry_name_output, name)?;
        }

        for binding in bindings {
            let value = entry.map_or(Value::Null, |e| {
                Cell::from(e.attribute(&binding.attribute)).into_value()
            });
            binder.set_output(&binding.output, value)?;
        }
        Ok(())
    }

    /// Writes a table to the aggregate output slot.
    ///
    /// ## Errors
    ///
    /// Returns a binding error if the slot cannot be written.
    pub fn bind_table<D>(&self, table: OutputTable, data: &mut D) -> QueryResult<()>
    where
        D: VariableResolver + OutputBinder + ?Sized,
    {
        let ResultSpec::MultiRow { output, .. } = &self.spec.result else {
            return Ok(());
        };
        let current = resolve_variable(&*data, output);
        let value = table.into_slot_value(current.as_ref());
        data.set_output(output, value)
    }
}
