//! The directory query element.
//!
//! [`LdapQueryElement`] holds a decoded [`QuerySpec`] and runs it against a
//! directory each time the host calls [`LdapQueryElement::perform`]. The
//! specification is read-only during a run, so one element can serve
//! concurrent invocations.
//!
//! ## Resource handling
//!
//! The directory session is opened right before the search and closed on
//! every exit path, cursor first. Failures while closing are logged and
//! never replace the error that ended the run.

use crate::config::{QuerySpec, ServerConfig};
use crate::connection::Ldap3Connector;
use crate::error::QueryResult;
use crate::filter::{build_filter, resolve_base_object};
use crate::mapper::ResultMapper;
use crate::search::{
    DirectoryClient, DirectoryConnector, DirectoryEntry, EntryCursor, SearchRequest,
};
use crate::value::{OutputBinder, VariableResolver};

/// Everything one invocation needs before talking to the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSearch {
    /// Resolved base object, as used in entry names.
    pub base_object: String,
    /// Server settings with variables expanded.
    pub server: ServerConfig,
    /// The search to run.
    pub request: SearchRequest,
}

/// Runs a configured directory query.
#[derive(Debug, Clone, Default)]
pub struct LdapQueryElement<C = Ldap3Connector> {
    spec: QuerySpec,
    connector: C,
}

impl LdapQueryElement<Ldap3Connector> {
    /// Creates an element with the default specification, talking `ldap3`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: DirectoryConnector> LdapQueryElement<C> {
    /// Creates an element using `connector` for directory access.
    #[must_use]
    pub fn with_connector(connector: C) -> Self {
        Self {
            spec: QuerySpec::default(),
            connector,
        }
    }

    /// Replaces the specification.
    #[must_use]
    pub fn with_spec(mut self, spec: QuerySpec) -> Self {
        self.spec = spec;
        self
    }

    /// Applies a configuration payload.
    ///
    /// A payload that cannot be decoded is logged and ignored; the previous
    /// specification stays in effect.
    pub fn set_configuration(&mut self, text: &str) {
        match QuerySpec::decode(text) {
            Ok(spec) => {
                tracing::debug!(
                    scope = ?spec.scope,
                    multi_row = spec.is_multi_row(),
                    attributes = spec.projected_attributes().len(),
                    "query configuration applied"
                );
                self.spec = spec;
            }
            Err(e) => {
                tracing::warn!(error = %e, "invalid query configuration, keeping previous settings");
            }
        }
    }

    /// Returns the current specification.
    #[must_use]
    pub const fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Returns the directory connector.
    #[must_use]
    pub const fn connector(&self) -> &C {
        &self.connector
    }

    /// Resolves filter, base object and server settings against `resolver`.
    #[must_use]
    pub fn prepare<R: VariableResolver + ?Sized>(&self, resolver: &R) -> PreparedSearch {
        let base_object = resolve_base_object(&self.spec.base_object, resolver);
        let server = self.spec.server.expand(resolver);
        let request = SearchRequest {
            base: server.search_base(&base_object),
            scope: self.spec.scope,
            filter: build_filter(&self.spec.filter, resolver),
            attributes: self
                .spec
                .projected_attributes()
                .into_iter()
                .map(String::from)
                .collect(),
        };
        PreparedSearch {
            base_object,
            server,
            request,
        }
    }

    /// Runs the query and writes its results into `data`.
    ///
    /// ## Errors
    ///
    /// Returns a directory error if connecting, binding or searching fails,
    /// and a binding error if a result cannot be written.
    pub async fn perform<D>(&self, data: &mut D) -> QueryResult<()>
    where
        D: VariableResolver + OutputBinder + ?Sized,
    {
        let prepared = self.prepare(&*data);
        tracing::debug!(
            base = %prepared.request.base,
            scope = ?prepared.request.scope,
            filter = %prepared.request.filter,
            attributes = ?prepared.request.attributes,
            "searching directory"
        );

        let entries = self.fetch(&prepared).await?;
        tracing::debug!(entries = entries.len(), "directory search finished");

        let mapper = ResultMapper::new(&self.spec, &prepared.base_object);
        if self.spec.is_multi_row() {
            let table = mapper.build_table(entries, &*data);
            mapper.bind_table(table, data)
        } else {
            mapper.bind_first_entry(entries.first(), data)
        }
    }

    /// Connects, searches and collects entries, releasing everything.
    async fn fetch(&self, prepared: &PreparedSearch) -> QueryResult<Vec<DirectoryEntry>> {
        let first_only = !self.spec.is_multi_row();
        let mut client = self.connector.connect(&prepared.server).await?;

        let outcome = match client.search(&prepared.request).await {
            Ok(mut cursor) => {
                let collected = collect_entries(&mut cursor, first_only).await;
                release("cursor", cursor.close().await);
                collected
            }
            Err(e) => Err(e),
        };

        release("connection", client.close().await);
        outcome
    }
}

async fn collect_entries<K: EntryCursor>(
    cursor: &mut K,
    first_only: bool,
) -> QueryResult<Vec<DirectoryEntry>> {
    let mut entries = Vec::new();
    while let Some(entry) = cursor.next_entry().await? {
        entries.push(entry);
        if first_only {
            break;
        }
    }
    Ok(entries)
}

fn release(resource: &str, result: QueryResult<()>) {
    if let Err(e) = result {
        tracing::debug!(resource, error = %e, "release failed, ignored");
    }
}
