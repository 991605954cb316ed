//! Fixture-backed directory.
//!
//! [`ReplayDirectory`] answers every search with a canned list of entries
//! and keeps a log of what the element asked for and released. The CLI
//! uses it for offline runs (`ldq run --entries`); the tests use it to
//! check projection, release and failure handling without a server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::error::{QueryError, QueryResult};
use crate::search::{
    DirectoryClient, DirectoryConnector, DirectoryEntry, EntryCursor, SearchRequest,
};

/// Injected failures.
#[derive(Debug, Clone, Default)]
struct Faults {
    connect: Option<String>,
    search: Option<String>,
    entry_at: Option<usize>,
}

/// Counters and recorded requests, shared by all clones of a directory.
#[derive(Debug, Default)]
struct ReplayLog {
    requests: Mutex<Vec<SearchRequest>>,
    connects: AtomicUsize,
    entries_pulled: AtomicUsize,
    cursors_closed: AtomicUsize,
    clients_closed: AtomicUsize,
}

/// A directory serving canned entries.
///
/// Clones share the same log, so a test can hand one clone to the element
/// and inspect the other afterwards.
#[derive(Debug, Clone, Default)]
pub struct ReplayDirectory {
    entries: Arc<Vec<DirectoryEntry>>,
    faults: Faults,
    log: Arc<ReplayLog>,
}

impl ReplayDirectory {
    /// Creates a directory serving `entries` in order.
    #[must_use]
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries: Arc::new(entries),
            ..Self::default()
        }
    }

    /// Loads entries from a JSON array of `{ "name": .., "attributes": {..} }`.
    ///
    /// ## Errors
    ///
    /// Returns [`QueryError::Configuration`] if the fixture is not valid JSON.
    pub fn from_json(json: &str) -> QueryResult<Self> {
        let entries: Vec<DirectoryEntry> = serde_json::from_str(json)
            .map_err(|e| QueryError::config(format!("invalid entry fixture: {e}")))?;
        Ok(Self::new(entries))
    }

    /// Makes every connect attempt fail with a connection error.
    #[must_use]
    pub fn failing_connect(mut self, message: impl Into<String>) -> Self {
        self.faults.connect = Some(message.into());
        self
    }

    /// Makes every search fail with a search error.
    #[must_use]
    pub fn failing_search(mut self, message: impl Into<String>) -> Self {
        self.faults.search = Some(message.into());
        self
    }

    /// Makes iteration fail when the entry at `index` is pulled.
    #[must_use]
    pub fn failing_at_entry(mut self, index: usize) -> Self {
        self.faults.entry_at = Some(index);
        self
    }

    /// Returns the canned entries.
    #[must_use]
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// Returns all search requests received so far.
    pub async fn requests(&self) -> Vec<SearchRequest> {
        self.log.requests.lock().await.clone()
    }

    /// Returns the number of successful connects.
    #[must_use]
    pub fn connects(&self) -> usize {
        self.log.connects.load(Ordering::SeqCst)
    }

    /// Returns the number of entries handed out by cursors.
    #[must_use]
    pub fn entries_pulled(&self) -> usize {
        self.log.entries_pulled.load(Ordering::SeqCst)
    }

    /// Returns the number of closed cursors.
    #[must_use]
    pub fn cursors_closed(&self) -> usize {
        self.log.cursors_closed.load(Ordering::SeqCst)
    }

    /// Returns the number of closed clients.
    #[must_use]
    pub fn clients_closed(&self) -> usize {
        self.log.clients_closed.load(Ordering::SeqCst)
    }
}

impl DirectoryConnector for ReplayDirectory {
    type Client = ReplayClient;

    async fn connect(&self, server: &ServerConfig) -> QueryResult<Self::Client> {
        if let Some(message) = &self.faults.connect {
            return Err(QueryError::connection(format!("{}: {message}", server.effective_url())));
        }
        self.log.connects.fetch_add(1, Ordering::SeqCst);
        Ok(ReplayClient {
            directory: self.clone(),
        })
    }
}

/// A session on a [`ReplayDirectory`].
#[derive(Debug)]
pub struct ReplayClient {
    directory: ReplayDirectory,
}

impl DirectoryClient for ReplayClient {
    type Cursor = ReplayCursor;

    async fn search(&mut self, request: &SearchRequest) -> QueryResult<Self::Cursor> {
        self.directory.log.requests.lock().await.push(request.clone());
        if let Some(message) = &self.directory.faults.search {
            return Err(QueryError::search(message.clone()));
        }
        Ok(ReplayCursor {
            directory: self.directory.clone(),
            attributes: request.attributes.clone(),
            position: 0,
        })
    }

    async fn close(self) -> QueryResult<()> {
        self.directory.log.clients_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Cursor over canned entries.
#[derive(Debug)]
pub struct ReplayCursor {
    directory: ReplayDirectory,
    attributes: Vec<String>,
    position: usize,
}

impl ReplayCursor {
    /// Keeps only the requested attributes, as a server would.
    fn project(&self, entry: &DirectoryEntry) -> DirectoryEntry {
        let attributes = entry
            .attributes
            .iter()
            .filter(|(name, _)| self.attributes.iter().any(|a| a.eq_ignore_ascii_case(name)))
            .map(|(name, values)| (name.clone(), values.clone()))
            .collect();
        DirectoryEntry {
            name: entry.name.clone(),
            attributes,
        }
    }
}

impl EntryCursor for ReplayCursor {
    async fn next_entry(&mut self) -> QueryResult<Option<DirectoryEntry>> {
        if self.directory.faults.entry_at == Some(self.position) {
            return Err(QueryError::search(format!(
                "result stream broken at entry {}",
                self.position
            )));
        }
        let Some(entry) = self.directory.entries.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;
        self.directory.log.entries_pulled.fetch_add(1, Ordering::SeqCst);
        Ok(Some(self.project(entry)))
    }

    async fn close(self) -> QueryResult<()> {
        self.directory.log.cursors_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
