//! Client-side list state for a filtered list query.
//!
//! Each query is tagged with a ticket when it starts. Only the result for the
//! most recent ticket is applied, so a slow earlier query can never overwrite
//! the rows of a later one.

use tracing::debug;

use crate::auth::{self, Session};
use crate::records::model::{ListFilter, Record, RecordKind};
use crate::records::store::{RecordStore, StoreError};

pub const LIST_FALLBACK: &str = "Failed to load records";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket(u64);

#[derive(Debug, Default)]
pub struct ListView {
    latest: u64,
    rows: Vec<Record>,
    error: Option<String>,
    pending: bool,
}

impl ListView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a query. Any ticket handed out earlier becomes stale.
    pub fn begin(&mut self) -> QueryTicket {
        self.latest += 1;
        self.pending = true;
        QueryTicket(self.latest)
    }

    /// Applies a query result. Returns `false` when the result was stale and
    /// has been discarded.
    pub fn finish(&mut self, ticket: QueryTicket, result: Result<Vec<Record>, StoreError>) -> bool {
        if ticket.0 != self.latest {
            debug!("Discarding stale list result {} (latest {})", ticket.0, self.latest);
            return false;
        }
        self.pending = false;
        match result {
            Ok(rows) => {
                self.rows = rows;
                self.error = None;
            }
            Err(err) => {
                self.rows.clear();
                self.error = Some(err.user_message().unwrap_or_else(|| LIST_FALLBACK.to_string()));
            }
        }
        true
    }

    /// Runs one query against `store` and applies it.
    pub async fn refresh(
        &mut self,
        store: &dyn RecordStore,
        session: Option<&Session>,
        kind: RecordKind,
        filter: &ListFilter,
    ) -> bool {
        let ticket = self.begin();
        let result = match auth::require(session) {
            Ok(session) => store.list(session, kind, filter).await,
            Err(err) => Err(err),
        };
        self.finish(ticket, result)
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
