//! `ldap3` directory backend.
//!
//! ## Security
//!
//! Bind credentials are passed straight to the server and are never logged.
//! With `use_ssl` the connection is LDAPS from the start.

use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, ResultEntry, SearchStream};

use crate::config::{LdapVendor, ServerConfig};
use crate::error::{QueryError, QueryResult};
use crate::search::{
    DirectoryClient, DirectoryConnector, DirectoryEntry, EntryCursor, SearchRequest,
};

/// Filter used when the configured filter is empty.
const MATCH_ALL_FILTER: &str = "(objectClass=*)";

/// Attribute list requesting no attributes at all.
const NO_ATTRIBUTES: &str = "1.1";

/// Opens sessions with `ldap3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ldap3Connector;

impl Ldap3Connector {
    /// Creates a new connector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DirectoryConnector for Ldap3Connector {
    type Client = Ldap3Client;

    async fn connect(&self, server: &ServerConfig) -> QueryResult<Self::Client> {
        let url = server.effective_url();
        tracing::debug!(url = %url, vendor = server.vendor.provider_name(), "connecting to directory");

        let (conn, mut ldap) = LdapConnAsync::with_settings(LdapConnSettings::new(), &url)
            .await
            .map_err(|e| QueryError::Connection(e.to_string()))?;

        // Spawn connection driver
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::warn!("LDAP connection driver error: {}", e);
            }
        });

        if server.requires_bind() {
            ldap.simple_bind(&server.user_name, &server.password)
                .await
                .map_err(|e| QueryError::Bind(e.to_string()))?
                .success()
                .map_err(|e| QueryError::Bind(format!("Bind failed: {e}")))?;
        }

        Ok(Ldap3Client {
            ldap,
            vendor: server.vendor,
        })
    }
}

/// A bound `ldap3` session.
pub struct Ldap3Client {
    ldap: Ldap,
    vendor: LdapVendor,
}

impl std::fmt::Debug for Ldap3Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ldap3Client")
            .field("vendor", &self.vendor)
            .finish_non_exhaustive()
    }
}

impl DirectoryClient for Ldap3Client {
    type Cursor = Ldap3Cursor;

    async fn search(&mut self, request: &SearchRequest) -> QueryResult<Self::Cursor> {
        let filter = if request.filter.is_empty() {
            MATCH_ALL_FILTER
        } else {
            request.filter.as_str()
        };
        let attributes = if request.attributes.is_empty() {
            vec![NO_ATTRIBUTES.to_string()]
        } else {
            request.attributes.clone()
        };

        let stream = self
            .ldap
            .streaming_search(&request.base, request.scope.to_ldap3(), filter, attributes)
            .await
            .map_err(|e| QueryError::Search(e.to_string()))?;

        Ok(Ldap3Cursor {
            stream,
            base: request.base.clone(),
            vendor: self.vendor,
            finished: false,
        })
    }

    async fn close(mut self) -> QueryResult<()> {
        self.ldap.unbind().await?;
        Ok(())
    }
}

/// Streams entries of one `ldap3` search.
pub struct Ldap3Cursor {
    stream: SearchStream<'static, String, Vec<String>>,
    base: String,
    vendor: LdapVendor,
    finished: bool,
}

impl std::fmt::Debug for Ldap3Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ldap3Cursor")
            .field("base", &self.base)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl Ldap3Cursor {
    async fn finish(&mut self) -> QueryResult<()> {
        self.finished = true;
        self.stream
            .finish()
            .await
            .success()
            .map_err(|e| QueryError::Search(format!("Search failed: {e}")))?;
        Ok(())
    }

    fn convert(&self, entry: ResultEntry) -> DirectoryEntry {
        DirectoryEntry::from_search_entry(ldap3::SearchEntry::construct(entry), &self.base, self.vendor)
    }
}

impl EntryCursor for Ldap3Cursor {
    async fn next_entry(&mut self) -> QueryResult<Option<DirectoryEntry>> {
        if self.finished {
            return Ok(None);
        }
        match self
            .stream
            .next()
            .await
            .map_err(|e| QueryError::Search(e.to_string()))?
        {
            Some(entry) => Ok(Some(self.convert(entry))),
            None => {
                self.finish().await?;
                Ok(None)
            }
        }
    }

    async fn close(mut self) -> QueryResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        // An unread stream only yields a synthetic result; the server keeps
        // sending entries until the operation is abandoned.
        let msgid = self.stream.ldap_handle().last_id();
        let result = self.stream.finish().await;
        tracing::trace!(base = %self.base, rc = result.rc, msgid, "abandoning unread search");
        self.stream.ldap_handle().abandon(msgid).await?;
        Ok(())
    }
}
