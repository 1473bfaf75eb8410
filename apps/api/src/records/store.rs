use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Session;
use crate::records::model::{ListFilter, Record, RecordKind};

/// Failures reported by the persistence and session collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ValidationFailed(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session backend error: {0}")]
    SessionBackend(String),
}

impl StoreError {
    /// The message safe to show an end user, if the error carries one.
    /// Backend failures return `None` so callers fall back to a generic text.
    pub fn user_message(&self) -> Option<String> {
        match self {
            StoreError::Database(_) | StoreError::SessionBackend(_) => None,
            other => Some(other.to_string()),
        }
    }

    pub fn not_found(kind: RecordKind, id: Uuid) -> Self {
        StoreError::NotFound(format!("{} {id} not found", kind.label()))
    }

    pub fn duplicate_email(email: &str) -> Self {
        StoreError::Conflict(format!("A candidate with email {email} already exists"))
    }

    pub fn unknown_reference(field: &str, target: RecordKind) -> Self {
        StoreError::ValidationFailed(format!(
            "{field} does not reference an existing {}",
            target.label().to_lowercase()
        ))
    }

    pub fn client_in_use(id: Uuid) -> Self {
        StoreError::Conflict(format!("Client {id} still has requirements"))
    }
}

/// CRUD over records.
///
/// Every operation receives the caller's resolved session explicitly; the
/// store never looks one up on its own. `update` is a partial update: keys
/// missing from `fields` keep their stored value, explicit `null` clears.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create(
        &self,
        session: &Session,
        kind: RecordKind,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError>;

    async fn update(
        &self,
        session: &Session,
        kind: RecordKind,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError>;

    async fn get(&self, session: &Session, kind: RecordKind, id: Uuid)
        -> Result<Record, StoreError>;

    /// Records matching every present predicate of `filter`, newest first.
    async fn list(
        &self,
        session: &Session,
        kind: RecordKind,
        filter: &ListFilter,
    ) -> Result<Vec<Record>, StoreError>;

    async fn delete(&self, session: &Session, kind: RecordKind, id: Uuid)
        -> Result<(), StoreError>;

    /// Points a candidate at an uploaded resume. `resumeUrl` is not writable
    /// through `update`.
    async fn set_resume_url(
        &self,
        session: &Session,
        candidate_id: Uuid,
        url: &str,
    ) -> Result<Record, StoreError>;
}
