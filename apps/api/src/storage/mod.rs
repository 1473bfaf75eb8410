//! File storage collaborator, used for candidate resume attachments.

pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

/// Word and PDF documents.
pub const RESUME_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

pub const DEFAULT_RESUME_MAX_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    /// `size` is `None` when the upload was cut off before it was fully read.
    #[error("File size should be less than {}MB", .limit / (1024 * 1024))]
    TooLarge { size: Option<usize>, limit: usize },

    #[error("Invalid file type '{0}'. Please upload a PDF or Word document.")]
    InvalidType(String),

    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Clone)]
pub struct FileConstraints {
    pub max_size: usize,
    pub allowed_types: Vec<String>,
}

impl FileConstraints {
    pub fn resumes(max_size: usize) -> Self {
        Self {
            max_size,
            allowed_types: RESUME_CONTENT_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn check(&self, size: usize, content_type: &str) -> Result<(), StorageError> {
        if !self.allowed_types.iter().any(|t| t == content_type) {
            return Err(StorageError::InvalidType(content_type.to_string()));
        }
        if size > self.max_size {
            return Err(StorageError::TooLarge {
                size: Some(size),
                limit: self.max_size,
            });
        }
        Ok(())
    }
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Writes `blob` under `key` and returns the URL it can be fetched from.
    async fn put(&self, key: &str, blob: Bytes, content_type: &str) -> Result<String, StorageError>;
}

/// Checks `constraints` and only then hands the blob to the backend.
pub async fn store(
    files: &dyn FileStore,
    key: &str,
    blob: Bytes,
    content_type: &str,
    constraints: &FileConstraints,
) -> Result<String, StorageError> {
    constraints.check(blob.len(), content_type)?;
    files.put(key, blob, content_type).await
}

/// Object key for a candidate's resume. The random prefix keeps re-uploads of
/// the same file name from overwriting each other.
pub fn resume_key(candidate_id: Uuid, file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = safe.trim_matches('.');
    let safe = if safe.is_empty() { "resume" } else { safe };
    format!("resumes/{candidate_id}/{}-{safe}", Uuid::new_v4().simple())
}
