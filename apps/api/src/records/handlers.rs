//! Axum route handlers for the record collections.
//!
//! `:collection` is `candidates`, `clients` or `requirements`. Handlers receive
//! the session resolved by `auth::middleware::require_session`.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::records::model::{ListFilter, Record, RecordKind};
use crate::state::AppState;
use crate::storage::{self, FileConstraints, StorageError};

const RESUME_FIELD: &str = "resume";

fn collection_kind(collection: &str) -> Result<RecordKind, AppError> {
    RecordKind::from_collection(collection)
        .ok_or_else(|| AppError::NotFound(format!("Unknown collection '{collection}'")))
}

/// A malformed id can never name a stored record, so it reads as not found.
fn record_id(kind: RecordKind, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("{} {raw} not found", kind.label())))
}

/// A body cut off by the route's size limit is reported like any other
/// oversized file.
fn multipart_error(err: MultipartError, constraints: &FileConstraints, context: &str) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return StorageError::TooLarge {
            size: None,
            limit: constraints.max_size,
        }
        .into();
    }
    AppError::Validation(format!("{context}: {err}"))
}

/// GET /api/v1/:collection
pub async fn handle_list(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(collection): Path<String>,
    Query(filter): Query<ListFilter>,
) -> Result<Json<Vec<Record>>, AppError> {
    let kind = collection_kind(&collection)?;
    let records = state.records.list(&session, kind, &filter).await?;
    Ok(Json(records))
}

/// POST /api/v1/:collection
pub async fn handle_create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(collection): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<Record>), AppError> {
    let kind = collection_kind(&collection)?;
    let record = state.records.create(&session, kind, body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/:collection/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Record>, AppError> {
    let kind = collection_kind(&collection)?;
    let id = record_id(kind, &id)?;
    Ok(Json(state.records.get(&session, kind, id).await?))
}

/// PUT /api/v1/:collection/:id
///
/// Partial update: fields omitted from the body keep their stored values.
pub async fn handle_update(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<Record>, AppError> {
    let kind = collection_kind(&collection)?;
    let id = record_id(kind, &id)?;
    Ok(Json(state.records.update(&session, kind, id, body).await?))
}

/// DELETE /api/v1/:collection/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let kind = collection_kind(&collection)?;
    let id = record_id(kind, &id)?;
    state.records.delete(&session, kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/candidates/:id/resume
///
/// Multipart upload with a single `resume` file part. The file is checked
/// against the resume constraints before it reaches storage.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((collection, id)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Result<Json<Record>, AppError> {
    let kind = collection_kind(&collection)?;
    if kind != RecordKind::Candidate {
        return Err(AppError::NotFound(format!(
            "{} records do not accept resumes",
            kind.label()
        )));
    }
    let candidate_id = record_id(kind, &id)?;
    // 404 before anything is uploaded.
    state.records.get(&session, kind, candidate_id).await?;

    let constraints = FileConstraints::resumes(state.config.resume_max_bytes);
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, &constraints, "Malformed multipart body"))?
    {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("resume").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, &constraints, "Failed to read upload"))?;
        upload = Some((file_name, content_type, data));
        break;
    }
    let (file_name, content_type, data) =
        upload.ok_or_else(|| AppError::Validation("Missing required field 'resume'".to_string()))?;

    let key = storage::resume_key(candidate_id, &file_name);
    let url = storage::store(state.files.as_ref(), &key, data, &content_type, &constraints).await?;
    info!("Stored resume for candidate {candidate_id} at {url}");

    let record = state
        .records
        .set_resume_url(&session, candidate_id, &url)
        .await?;
    Ok(Json(record))
}
