use super::{BlobStore, StoredBlob};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;
use video_core::constants::ALLOWED_VIDEO_EXTENSIONS;

#[derive(Default)]
struct BlobState {
    objects: BTreeSet<String>,
    deleted: Vec<String>,
    uploads: usize,
    fail_uploads_after: Option<usize>,
    fail_deletes: bool,
}

/// Process-local blob store for tests and local runs.
///
/// Video files report `media_duration` seconds; images report none. Failures
/// can be injected to exercise cleanup paths.
pub struct MemoryBlobStore {
    state: Mutex<BlobState>,
    media_duration: f64,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new(60.0)
    }
}

impl MemoryBlobStore {
    pub fn new(media_duration: f64) -> Self {
        Self {
            state: Mutex::new(BlobState::default()),
            media_duration,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BlobState> {
        // A panic mid-update cannot leave BlobState inconsistent
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Let `successes` more uploads through, then fail the rest
    pub fn fail_uploads_after(&self, successes: usize) {
        let mut state = self.lock();
        state.fail_uploads_after = Some(state.uploads + successes);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.lock().fail_deletes = fail;
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().objects.contains(url)
    }

    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    /// URLs passed to successful deletes, in call order
    pub fn deleted(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, local_path: &Path) -> Result<StoredBlob> {
        let extension = local_path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let mut state = self.lock();
        if state
            .fail_uploads_after
            .is_some_and(|limit| state.uploads >= limit)
        {
            return Err(AppError::Blob(format!(
                "upload rejected: {}",
                local_path.display()
            )));
        }
        state.uploads += 1;

        let url = format!("memory://blobs/{}.{extension}", Uuid::new_v4());
        state.objects.insert(url.clone());

        let duration = ALLOWED_VIDEO_EXTENSIONS
            .contains(&extension.as_str())
            .then_some(self.media_duration);

        Ok(StoredBlob { url, duration })
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let mut state = self.lock();
        if state.fail_deletes {
            return Err(AppError::Blob(format!("delete rejected: {url}")));
        }
        state.objects.remove(url);
        state.deleted.push(url.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_reports_duration_for_media_only() {
        let blobs = MemoryBlobStore::new(42.5);

        let clip = blobs.upload(Path::new("/tmp/clip.MP4")).await.unwrap();
        assert_eq!(clip.duration, Some(42.5));
        assert!(blobs.contains(&clip.url));

        let image = blobs.upload(Path::new("/tmp/face.png")).await.unwrap();
        assert_eq!(image.duration, None);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let blobs = MemoryBlobStore::default();
        blobs.fail_uploads_after(1);

        let first = blobs.upload(Path::new("a.png")).await.unwrap();
        assert!(blobs.upload(Path::new("b.png")).await.is_err());

        blobs.set_fail_deletes(true);
        assert!(blobs.delete(&first.url).await.is_err());
        assert!(blobs.contains(&first.url));

        blobs.set_fail_deletes(false);
        blobs.delete(&first.url).await.unwrap();
        assert_eq!(blobs.deleted(), vec![first.url]);
        assert_eq!(blobs.object_count(), 0);
    }
}
