//! Host data model.
//!
//! The process engine hands the element a tree of records rooted at `in`.
//! The element reads variables through [`VariableResolver`] and writes its
//! results through [`OutputBinder`]. [`ProcessData`] is the in-memory tree
//! used by the CLI and the tests.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

/// Prefix marking a variable reference (`in.customer.name`).
pub const VARIABLE_PREFIX: &str = "in.";

/// A record: named fields, each holding a [`Value`].
pub type Record = BTreeMap<String, Value>;

/// A value in the host's object graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// No value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number.
    Number(serde_json::Number),
    /// String.
    Text(String),
    /// Ordered list.
    List(Vec<Value>),
    /// Two-dimensional table with named columns.
    Recordset(Recordset),
    /// Nested record.
    Record(Record),
}

impl Value {
    /// Checks if this is [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Checks if this is a [`Value::Recordset`].
    #[must_use]
    pub const fn is_recordset(&self) -> bool {
        matches!(self, Self::Recordset(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Recordset(rs) => write!(
                f,
                "Recordset[{} columns, {} rows]",
                rs.columns.len(),
                rs.rows.len()
            ),
            Self::Record(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}={value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::List(items.into_iter().map(Self::Text).collect())
    }
}

impl From<Record> for Value {
    fn from(fields: Record) -> Self {
        Self::Record(fields)
    }
}

impl From<Recordset> for Value {
    fn from(rs: Recordset) -> Self {
        Self::Recordset(rs)
    }
}

/// A table of values with named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recordset {
    /// Column names.
    pub columns: Vec<String>,
    /// Rows, each with one value per column.
    pub rows: Vec<Vec<Value>>,
}

/// Resolves variable references against the host's current data.
pub trait VariableResolver {
    /// Resolves `name` (for example `in.customer.name`).
    ///
    /// Returns `None` when the name does not denote a variable.
    fn resolve(&self, name: &str) -> Option<Value>;
}

/// Writes values back into the host's data.
pub trait OutputBinder {
    /// Writes `value` at the dotted `path`.
    ///
    /// ## Errors
    ///
    /// Returns [`QueryError::Binding`] when a parent segment does not exist
    /// or is not a record.
    fn set_output(&mut self, path: &str, value: Value) -> QueryResult<()>;
}

/// Resolves `name` as a variable.
///
/// Names already containing the `in.` marker are resolved as given,
/// anything else is tried with the prefix. A `Null` value counts as
/// unresolved.
pub fn resolve_variable<R: VariableResolver + ?Sized>(resolver: &R, name: &str) -> Option<Value> {
    let value = if name.contains(VARIABLE_PREFIX) {
        resolver.resolve(name)
    } else {
        resolver.resolve(&format!("{VARIABLE_PREFIX}{name}"))
    };
    value.filter(|v| !v.is_null())
}

/// Resolves `name` as a variable and falls back to the name itself.
pub fn resolve_or_literal<R: VariableResolver + ?Sized>(resolver: &R, name: &str) -> String {
    resolve_variable(resolver, name).map_or_else(|| name.to_string(), |v| v.to_string())
}

/// Strips one leading `in.` marker.
#[must_use]
pub fn strip_variable_prefix(expr: &str) -> &str {
    expr.strip_prefix(VARIABLE_PREFIX).unwrap_or(expr)
}

/// In-memory process data rooted at `in`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessData {
    root: Record,
}

impl ProcessData {
    /// Creates empty process data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing record.
    #[must_use]
    pub const fn from_record(root: Record) -> Self {
        Self { root }
    }

    /// Returns the root record.
    #[must_use]
    pub const fn root(&self) -> &Record {
        &self.root
    }

    /// Gets the value at a dotted path relative to the root.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = strip_variable_prefix(path).split('.');
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = match current {
                Value::Record(fields) => fields.get(segment)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl VariableResolver for ProcessData {
    fn resolve(&self, name: &str) -> Option<Value> {
        let path = name.trim().strip_prefix(VARIABLE_PREFIX)?;
        if path.is_empty() {
            return None;
        }
        self.get(path).cloned()
    }
}

impl OutputBinder for ProcessData {
    fn set_output(&mut self, path: &str, value: Value) -> QueryResult<()> {
        let relative = strip_variable_prefix(path);
        let mut segments: Vec<&str> = relative.split('.').collect();
        let field = segments.pop().unwrap_or_default();
        if field.is_empty() {
            return Err(QueryError::binding(path, "empty field name"));
        }

        let mut current = &mut self.root;
        for segment in segments {
            current = match current.get_mut(segment) {
                Some(Value::Record(next)) => next,
                Some(_) => {
                    return Err(QueryError::binding(
                        path,
                        format!("'{segment}' is not a record"),
                    ))
                }
                None => {
                    return Err(QueryError::binding(
                        path,
                        format!("'{segment}' does not exist"),
                    ))
                }
            };
        }
        current.insert(field.to_string(), value);
        Ok(())
    }
}
