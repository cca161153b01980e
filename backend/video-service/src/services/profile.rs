//! Avatar and cover replacement
//!
//! Upload first, then swap the stored URL, then delete the previous blob.
//! A failed upload changes nothing; a failed delete leaves an orphan that is
//! logged and otherwise ignored.

use crate::blob::{delete_orphan, BlobStore};
use crate::error::{AppError, Result};
use crate::models::{AccountView, Identity, MediaSlot};
use crate::repository::Repositories;
use crate::services::required_upload;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use video_core::constants::ALLOWED_IMAGE_EXTENSIONS;

#[derive(Clone)]
pub struct ProfileService {
    repos: Repositories,
    blobs: Arc<dyn BlobStore>,
}

impl ProfileService {
    pub fn new(repos: Repositories, blobs: Arc<dyn BlobStore>) -> Self {
        Self { repos, blobs }
    }

    pub async fn update_avatar(
        &self,
        identity: &Identity,
        local_path: Option<&Path>,
    ) -> Result<AccountView> {
        self.replace(identity, MediaSlot::Avatar, local_path).await
    }

    pub async fn update_cover(
        &self,
        identity: &Identity,
        local_path: Option<&Path>,
    ) -> Result<AccountView> {
        self.replace(identity, MediaSlot::Cover, local_path).await
    }

    async fn replace(
        &self,
        identity: &Identity,
        slot: MediaSlot,
        local_path: Option<&Path>,
    ) -> Result<AccountView> {
        let path = required_upload(local_path, slot.as_str(), ALLOWED_IMAGE_EXTENSIONS)?;

        let exists = self
            .repos
            .run(
                "accounts.find_by_id",
                self.repos.accounts.find_by_id(identity.account_id),
            )
            .await?
            .is_some();
        if !exists {
            return Err(AppError::not_found("Account"));
        }

        let uploaded = self.blobs.upload(path).await?;

        let replaced = match self
            .repos
            .run(
                "accounts.replace_media",
                self.repos
                    .accounts
                    .replace_media(identity.account_id, slot, &uploaded.url),
            )
            .await
        {
            Ok(Some(replaced)) => replaced,
            Ok(None) => {
                delete_orphan(self.blobs.as_ref(), &uploaded.url, "account vanished").await;
                return Err(AppError::not_found("Account"));
            }
            Err(e) => {
                delete_orphan(self.blobs.as_ref(), &uploaded.url, "media update failed").await;
                return Err(e);
            }
        };

        if let Some(previous) = replaced
            .previous_url
            .as_deref()
            .filter(|previous| *previous != uploaded.url)
        {
            delete_orphan(self.blobs.as_ref(), previous, "replaced").await;
        }

        info!(
            account_id = %identity.account_id,
            slot = slot.as_str(),
            "Profile media updated"
        );
        Ok(replaced.account.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{MockBlobStore, StoredBlob};
    use crate::error::ErrorKind;
    use crate::models::NewAccount;
    use crate::repository::MemoryStore;
    use std::path::PathBuf;
    use std::time::Duration;

    async fn seeded() -> (Repositories, Identity) {
        let repos = Repositories::memory(Arc::new(MemoryStore::new()), Duration::from_secs(1));
        let account = repos
            .accounts
            .insert(NewAccount {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                full_name: "Alice".to_string(),
                password_hash: "hash".to_string(),
                avatar_url: "memory://old-avatar.png".to_string(),
                cover_url: None,
            })
            .await
            .unwrap();
        (repos, account.identity())
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_previous_avatar() {
        let (repos, identity) = seeded().await;
        let mut blobs = MockBlobStore::new();
        blobs
            .expect_upload()
            .times(1)
            .returning(|_| Err(AppError::Blob("timeout".to_string())));
        blobs.expect_delete().never();

        let service = ProfileService::new(repos.clone(), Arc::new(blobs));
        let path = PathBuf::from("/tmp/new.png");
        let err = service
            .update_avatar(&identity, Some(path.as_path()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        let stored = repos
            .accounts
            .find_by_id(identity.account_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.avatar_url, "memory://old-avatar.png");
    }

    #[tokio::test]
    async fn test_avatar_replaced_then_old_deleted() {
        let (repos, identity) = seeded().await;
        let mut blobs = MockBlobStore::new();
        blobs.expect_upload().times(1).returning(|_| {
            Ok(StoredBlob {
                url: "memory://new-avatar.png".to_string(),
                duration: None,
            })
        });
        blobs
            .expect_delete()
            .withf(|url| url == "memory://old-avatar.png")
            .times(1)
            .returning(|_| Ok(()));

        let service = ProfileService::new(repos, Arc::new(blobs));
        let path = PathBuf::from("/tmp/new.png");
        let view = service
            .update_avatar(&identity, Some(path.as_path()))
            .await
            .unwrap();
        assert_eq!(view.avatar_url, "memory://new-avatar.png");
    }

    #[tokio::test]
    async fn test_first_cover_deletes_nothing() {
        let (repos, identity) = seeded().await;
        let mut blobs = MockBlobStore::new();
        blobs.expect_upload().times(1).returning(|_| {
            Ok(StoredBlob {
                url: "memory://cover.png".to_string(),
                duration: None,
            })
        });
        blobs.expect_delete().never();

        let service = ProfileService::new(repos, Arc::new(blobs));
        let path = PathBuf::from("/tmp/cover.png");
        let view = service
            .update_cover(&identity, Some(path.as_path()))
            .await
            .unwrap();
        assert_eq!(view.cover_url.as_deref(), Some("memory://cover.png"));
    }

    #[tokio::test]
    async fn test_missing_file_is_upload_required() {
        let (repos, identity) = seeded().await;
        let service = ProfileService::new(repos, Arc::new(MockBlobStore::new()));

        let err = service.update_cover(&identity, None).await.unwrap_err();
        assert!(matches!(err, AppError::UploadRequired("cover")));
    }
}
