//! Object storage seam for avatars, covers, media files and thumbnails

mod memory;
mod s3;

pub use memory::MemoryBlobStore;
pub use s3::S3BlobStore;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, warn};

/// Durable location of an uploaded file
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub url: String,
    /// Media length in seconds, when the store can probe it
    pub duration: Option<f64>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload a local file; the local copy is consumed either way
    async fn upload(&self, local_path: &Path) -> Result<StoredBlob>;

    async fn delete(&self, url: &str) -> Result<()>;
}

/// Delete a blob whose record is already gone; failures are logged, not returned
pub async fn delete_orphan(blobs: &dyn BlobStore, url: &str, reason: &'static str) {
    match blobs.delete(url).await {
        Ok(()) => debug!(url, reason, "Deleted blob"),
        Err(e) => warn!(url, reason, error = %e, "Blob delete failed; object orphaned"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_delete_orphan_swallows_failures() {
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_delete()
            .withf(|url| url == "memory://old.png")
            .times(1)
            .returning(|_| Err(AppError::Blob("bucket unavailable".to_string())));

        delete_orphan(&blobs, "memory://old.png", "replaced").await;
    }
}
