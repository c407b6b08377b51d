use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::upstream::{GeneratedDocument, UpstreamError};

/// Keeps a copy of every generated document in S3 (or MinIO).
#[derive(Clone)]
pub struct DocumentArchive {
    s3: aws_sdk_s3::Client,
    bucket: String,
}

impl DocumentArchive {
    pub fn new(s3: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            s3,
            bucket: bucket.into(),
        }
    }

    pub async fn store(
        &self,
        user_id: Uuid,
        document: &GeneratedDocument,
    ) -> Result<String, UpstreamError> {
        let key = archive_key(user_id, &document.filename, Utc::now().timestamp());
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(document.bytes.clone()))
            .content_type(&document.content_type)
            .send()
            .await
            .map_err(|e| UpstreamError::Archive(format!("S3 upload failed: {e}")))?;
        info!("Archived document to s3://{}/{}", self.bucket, key);
        Ok(key)
    }
}

pub fn archive_key(user_id: Uuid, filename: &str, timestamp: i64) -> String {
    let safe: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("documents/{user_id}/{timestamp}-{safe}")
}
