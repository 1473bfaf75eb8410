use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use crate::storage::{FileStore, StorageError};

/// S3 / MinIO backed file store.
pub struct S3FileStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    endpoint: String,
}

impl S3FileStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, endpoint: String) -> Self {
        Self {
            client,
            bucket,
            endpoint,
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.bucket,
            key
        )
    }
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn put(&self, key: &str, blob: Bytes, content_type: &str) -> Result<String, StorageError> {
        let size = blob.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(blob))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("S3 upload failed: {e}")))?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);
        Ok(self.object_url(key))
    }
}
