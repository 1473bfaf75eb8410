use std::sync::Arc;

use crate::auth::SessionResolver;
use crate::config::Config;
use crate::records::RecordStore;
use crate::storage::FileStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Collaborators are trait objects so tests can swap in in-memory backends.
#[derive(Clone)]
pub struct AppState {
    /// Persistence collaborator. Default: PgRecordStore.
    pub records: Arc<dyn RecordStore>,
    /// Session collaborator. Default: RedisSessionResolver.
    pub sessions: Arc<dyn SessionResolver>,
    /// File storage collaborator for resume uploads. Default: S3FileStore.
    pub files: Arc<dyn FileStore>,
    pub config: Config,
}
