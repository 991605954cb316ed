//! Query element error types.
//!
//! ## Security Note
//!
//! Error messages must not leak bind credentials. Connection and bind
//! failures carry the server's message only.

use thiserror::Error;

/// Errors raised while configuring or running a directory query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The configuration payload could not be parsed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Connection failed.
    #[error("LDAP connection failed: {0}")]
    Connection(String),

    /// Bind (authentication) failed.
    #[error("LDAP bind failed: {0}")]
    Bind(String),

    /// Search operation failed.
    #[error("LDAP search failed: {0}")]
    Search(String),

    /// An output path does not resolve to an existing record.
    #[error("cannot bind output '{path}': {reason}")]
    Binding {
        /// The output path as configured.
        path: String,
        /// Why the path could not be written.
        reason: String,
    },

    /// Underlying ldap3 error.
    #[error("LDAP error: {0}")]
    Ldap3(#[from] ldap3::LdapError),
}

impl QueryError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a search error.
    #[must_use]
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Creates a binding error for `path`.
    #[must_use]
    pub fn binding(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Binding {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Checks if this error came from the directory (connection, bind or search).
    #[must_use]
    pub const fn is_directory_error(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Bind(_) | Self::Search(_) | Self::Ldap3(_)
        )
    }

    /// Checks if this is a connection-related error.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Checks if this is an output binding error.
    #[must_use]
    pub const fn is_binding_error(&self) -> bool {
        matches!(self, Self::Binding { .. })
    }
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;
