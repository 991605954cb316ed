//! # ldq-query
//!
//! Directory query element for a process engine.
//!
//! The element is configured with property text, builds an LDAP search
//! from it and the host's variables, runs the search with `ldap3` and
//! maps the entries back into host values:
//!
//! - [`config`] decodes and encodes the configuration,
//! - [`filter`] builds the search filter,
//! - [`search`] and [`connection`] talk to the directory,
//! - [`mapper`] turns entries into outputs,
//! - [`element`] ties it together per invocation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod element;
pub mod error;
pub mod filter;
pub mod mapper;
pub mod properties;
pub mod replay;
pub mod search;
pub mod value;

pub use config::{
    AttributeBinding, AuthenticationKind, FilterSpec, FilterTerm, LdapVendor, QuerySpec,
    ResultSpec, SearchScope, ServerConfig, ENTRY_NAME_COLUMN,
};
pub use connection::Ldap3Connector;
pub use element::{LdapQueryElement, PreparedSearch};
pub use error::{QueryError, QueryResult};
pub use mapper::{Cell, OutputTable, ResultMapper, ResultRow};
pub use properties::Properties;
pub use replay::ReplayDirectory;
pub use search::{
    AttributeValue, DirectoryClient, DirectoryConnector, DirectoryEntry, EntryCursor,
    SearchRequest,
};
pub use value::{OutputBinder, ProcessData, Record, Recordset, Value, VariableResolver};
