use super::{BlobStore, StoredBlob};
use crate::error::Result;
use async_trait::async_trait;
use s3_utils::{S3Client, S3Operations};
use std::path::Path;

/// Blob store backed by an S3-compatible bucket.
///
/// S3 does not inspect media, so `duration` is always `None`.
#[derive(Clone)]
pub struct S3BlobStore {
    operations: S3Operations,
}

impl S3BlobStore {
    pub fn new(client: &S3Client) -> Self {
        Self {
            operations: client.operations(),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, local_path: &Path) -> Result<StoredBlob> {
        let object = self.operations.upload_path(local_path).await?;
        Ok(StoredBlob {
            url: object.url,
            duration: None,
        })
    }

    async fn delete(&self, url: &str) -> Result<()> {
        self.operations.delete_url(url).await?;
        Ok(())
    }
}
