//! Property-file codec for the element configuration.
//!
//! The configuration is persisted as classic `key=value` property text:
//! `#`/`!` comment lines, `=`, `:` or whitespace separators, backslash line
//! continuation and `\t \n \r \f \uXXXX` escapes. Writing escapes every
//! character outside printable ASCII so the text survives any transport.

use std::fmt;
use std::str::FromStr;

use crate::error::{QueryError, QueryResult};

/// An ordered set of string properties.
///
/// Setting an existing key replaces its value in place, so the order of
/// first insertion is kept when the set is written back out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    /// Creates an empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses property text.
    ///
    /// ## Errors
    ///
    /// Returns [`QueryError::Configuration`] for a malformed `\uXXXX` escape
    /// or an unpaired UTF-16 surrogate.
    pub fn parse(text: &str) -> QueryResult<Self> {
        let mut props = Self::new();
        for line in logical_lines(text) {
            let (raw_key, raw_value) = split_key_value(&line);
            let key = unescape(raw_key)?;
            let value = unescape(raw_value)?;
            props.set(key, value);
        }
        Ok(props)
    }

    /// Gets the value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Gets the value of `key`, or `default` when the key is missing.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Sets `key` to `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if there are no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Writes the properties as text, one `key=value` line each.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            escape_into(&mut out, key, true);
            out.push('=');
            escape_into(&mut out, value, false);
            out.push('\n');
        }
        out
    }
}

impl FromStr for Properties {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

const fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{c}')
}

/// Splits on `\n`, `\r` or `\r\n`.
fn natural_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split("\r\n")
        .flat_map(|chunk| chunk.split(|c: char| c == '\r' || c == '\n'))
}

/// Splits `text` into logical lines: comments and blank lines dropped,
/// continuation lines joined with their leading whitespace removed.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<String> = None;

    for natural in natural_lines(text) {
        let trimmed = natural.trim_start_matches(is_blank);

        let mut line = match current.take() {
            Some(mut pending) => {
                pending.push_str(trimmed);
                pending
            }
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                trimmed.to_string()
            }
        };

        let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            line.pop();
            current = Some(line);
        } else {
            lines.push(line);
        }
    }

    if let Some(pending) = current {
        lines.push(pending);
    }
    lines
}

/// Splits a logical line at the first unescaped separator.
fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    let mut separator = None;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                separator = Some(c);
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = &line[key_end..];
    if let Some(sep) = separator {
        rest = &rest[sep.len_utf8()..];
        return (key, rest.trim_start_matches(is_blank));
    }

    rest = rest.trim_start_matches(is_blank);
    if let Some(stripped) = rest.strip_prefix(|c| c == '=' || c == ':') {
        rest = stripped.trim_start_matches(is_blank);
    }
    (key, rest)
}

fn unescape(raw: &str) -> QueryResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut units: Vec<u16> = Vec::new();
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            flush_units(&mut out, &mut units)?;
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 {
                    return Err(QueryError::config(format!(
                        "malformed \\uxxxx encoding: \\u{hex}"
                    )));
                }
                let unit = u16::from_str_radix(&hex, 16).map_err(|_| {
                    QueryError::config(format!("malformed \\uxxxx encoding: \\u{hex}"))
                })?;
                units.push(unit);
            }
            Some(other) => {
                flush_units(&mut out, &mut units)?;
                out.push(match other {
                    't' => '\t',
                    'n' => '\n',
                    'r' => '\r',
                    'f' => '\u{c}',
                    c => c,
                });
            }
            None => flush_units(&mut out, &mut units)?,
        }
    }
    flush_units(&mut out, &mut units)?;
    Ok(out)
}

fn flush_units(out: &mut String, units: &mut Vec<u16>) -> QueryResult<()> {
    if units.is_empty() {
        return Ok(());
    }
    for decoded in char::decode_utf16(units.drain(..)) {
        let c = decoded.map_err(|e| {
            QueryError::config(format!(
                "unpaired surrogate \\u{:04X} in configuration",
                e.unpaired_surrogate()
            ))
        })?;
        out.push(c);
    }
    Ok(())
}

fn escape_into(out: &mut String, text: &str, is_key: bool) {
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            c if (' '..='~').contains(&c) => out.push(c),
            c => {
                let mut buf = [0u16; 2];
                for unit in c.encode_utf16(&mut buf) {
                    out.push_str(&format!("\\u{unit:04X}"));
                }
            }
        }
    }
}
