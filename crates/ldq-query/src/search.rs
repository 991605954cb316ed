//! Directory search abstractions.
//!
//! The element talks to a directory through three small traits:
//! [`DirectoryConnector`] opens a session, [`DirectoryClient`] runs a
//! search and [`EntryCursor`] pulls entries one at a time. Both the
//! `ldap3` backend ([`crate::connection`]) and the fixture backend
//! ([`crate::replay`]) implement them.

use std::collections::HashMap;

use ldap3::SearchEntry;
use serde::{Deserialize, Serialize};

use crate::config::{LdapVendor, SearchScope, ServerConfig};
use crate::error::QueryResult;

/// A directory entry with its attributes rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Entry name relative to the search base.
    pub name: String,

    /// Attributes (all values are multi-valued).
    #[serde(default)]
    pub attributes: HashMap<String, Vec<String>>,
}

/// View of one attribute of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeValue<'a> {
    /// The attribute is missing or has no values.
    Absent,
    /// Exactly one value.
    Single(&'a str),
    /// Two or more values, in directory order.
    Multi(&'a [String]),
}

impl DirectoryEntry {
    /// Creates an entry without attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Creates an entry from an `ldap3` search result.
    ///
    /// The entry name is made relative to `search_base`. Binary values of
    /// the vendor's GUID attribute are formatted as a GUID, other binary
    /// values as lowercase hex.
    #[must_use]
    pub fn from_search_entry(entry: SearchEntry, search_base: &str, vendor: LdapVendor) -> Self {
        let mut attributes = entry.attrs;
        let uuid_attr = vendor.uuid_attribute();

        for (name, values) in entry.bin_attrs {
            let is_guid = name.eq_ignore_ascii_case(uuid_attr);
            let rendered = values.iter().map(|bytes| {
                if is_guid {
                    format_guid(bytes)
                } else {
                    hex::encode(bytes)
                }
            });
            attributes.entry(name).or_default().extend(rendered);
        }

        Self {
            name: relative_name(&entry.dn, search_base),
            attributes,
        }
    }

    /// Looks up an attribute by name, ignoring case.
    #[must_use]
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(Vec::as_slice).or_else(|| {
            self.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_slice())
        })
    }

    /// Classifies an attribute as absent, single or multi-valued.
    #[must_use]
    pub fn attribute(&self, name: &str) -> AttributeValue<'_> {
        match self.values(name) {
            None | Some([]) => AttributeValue::Absent,
            Some([single]) => AttributeValue::Single(single),
            Some(many) => AttributeValue::Multi(many),
        }
    }
}

/// Strips `,<base>` from the end of `dn`, ignoring case.
///
/// The base object itself has an empty relative name.
#[must_use]
pub fn relative_name(dn: &str, search_base: &str) -> String {
    let base = search_base.trim();
    if base.is_empty() {
        return dn.to_string();
    }
    if dn.eq_ignore_ascii_case(base) {
        return String::new();
    }

    let split = match dn.len().checked_sub(base.len() + 1) {
        Some(split) if dn.is_char_boundary(split) => split,
        _ => return dn.to_string(),
    };
    let (name, suffix) = dn.split_at(split);
    match suffix.strip_prefix(',') {
        Some(tail) if tail.eq_ignore_ascii_case(base) => name.to_string(),
        _ => dn.to_string(),
    }
}

/// Formats a binary GUID (Active Directory format) as a string.
#[must_use]
pub fn format_guid(bytes: &[u8]) -> String {
    if bytes.len() != 16 {
        return hex::encode(bytes);
    }

    // Mixed endianness: the first three groups are little-endian.
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[3], bytes[2], bytes[1], bytes[0],
        bytes[5], bytes[4],
        bytes[7], bytes[6],
        bytes[8], bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

/// A fully resolved search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Search base DN (base object joined with the default context).
    pub base: String,
    /// Search scope.
    pub scope: SearchScope,
    /// LDAP filter; empty means "match everything".
    pub filter: String,
    /// Attributes to return; empty means "no attributes".
    pub attributes: Vec<String>,
}

/// Opens directory sessions.
#[allow(async_fn_in_trait)]
pub trait DirectoryConnector {
    /// Session type.
    type Client: DirectoryClient;

    /// Connects (and binds, if configured) to the directory.
    ///
    /// ## Errors
    ///
    /// Returns a connection, TLS or bind error.
    async fn connect(&self, server: &ServerConfig) -> QueryResult<Self::Client>;
}

/// An open directory session.
#[allow(async_fn_in_trait)]
pub trait DirectoryClient {
    /// Cursor over search results.
    type Cursor: EntryCursor;

    /// Starts a search.
    ///
    /// ## Errors
    ///
    /// Returns a search error if the server rejects the request.
    async fn search(&mut self, request: &SearchRequest) -> QueryResult<Self::Cursor>;

    /// Ends the session.
    ///
    /// ## Errors
    ///
    /// Returns an error if the session could not be closed cleanly.
    async fn close(self) -> QueryResult<()>;
}

/// Pulls search results one entry at a time.
#[allow(async_fn_in_trait)]
pub trait EntryCursor {
    /// Returns the next entry, or `None` when the search is exhausted.
    ///
    /// ## Errors
    ///
    /// Returns a search error if the result stream fails.
    async fn next_entry(&mut self) -> QueryResult<Option<DirectoryEntry>>;

    /// Releases the cursor.
    ///
    /// ## Errors
    ///
    /// Returns an error if the search could not be abandoned cleanly.
    async fn close(self) -> QueryResult<()>;
}
