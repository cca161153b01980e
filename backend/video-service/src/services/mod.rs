//! Core operations, one service per concern. Every service is cheap to clone
//! and takes the caller's identity as an explicit argument.

pub mod catalog;
pub mod channels;
pub mod profile;
pub mod session;
pub mod subscriptions;
pub mod videos;

pub use catalog::{CatalogQuery, CatalogService};
pub use channels::ChannelService;
pub use profile::ProfileService;
pub use session::{LoginOutcome, LoginRequest, RegisterRequest, SessionManager};
pub use subscriptions::SubscriptionService;
pub use videos::{DeletedVideo, PublishVideo, UpdateVideo, VideoService};

use crate::blob::BlobStore;
use crate::error::{AppError, Result};
use crate::models::Account;
use crate::repository::Repositories;
use crypto_core::JwtSigner;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;
use video_core::{Video, VideoSummary};

/// All services wired to one set of repositories, blob store and signer
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub profiles: ProfileService,
    pub subscriptions: SubscriptionService,
    pub channels: ChannelService,
    pub catalog: CatalogService,
    pub videos: VideoService,
}

impl AppState {
    pub fn new(repos: Repositories, blobs: Arc<dyn BlobStore>, signer: Arc<JwtSigner>) -> Self {
        Self {
            sessions: SessionManager::new(repos.clone(), blobs.clone(), signer),
            profiles: ProfileService::new(repos.clone(), blobs.clone()),
            subscriptions: SubscriptionService::new(repos.clone()),
            channels: ChannelService::new(repos.clone()),
            catalog: CatalogService::new(repos.clone()),
            videos: VideoService::new(repos, blobs),
        }
    }
}

/// Trimmed value, or `Validation` naming the blank field
pub(crate) fn required_text(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Local upload path with an allowed extension
pub(crate) fn required_upload<'a>(
    path: Option<&'a Path>,
    what: &'static str,
    allowed: &[&str],
) -> Result<&'a Path> {
    let path = path.ok_or(AppError::UploadRequired(what))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if !allowed.contains(&extension.as_str()) {
        return Err(AppError::validation(format!(
            "{what} must be one of: {}",
            allowed.join(", ")
        )));
    }
    Ok(path)
}

/// Join videos to their owners' projections, keeping the input order.
/// Videos whose owner cannot be loaded are dropped.
pub(crate) async fn summarize(repos: &Repositories, videos: Vec<Video>) -> Result<Vec<VideoSummary>> {
    let mut owner_ids: Vec<Uuid> = videos.iter().map(|v| v.owner_id).collect();
    owner_ids.sort_unstable();
    owner_ids.dedup();

    let owners: HashMap<Uuid, Account> = repos
        .run("accounts.find_by_ids", repos.accounts.find_by_ids(&owner_ids))
        .await?
        .into_iter()
        .map(|account| (account.id, account))
        .collect();

    Ok(videos
        .into_iter()
        .filter_map(|video| {
            let owner = owners.get(&video.owner_id)?.owner_projection();
            Some(VideoSummary::new(video, owner))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("  alice ", "username").unwrap(), "alice");
        let err = required_text("   ", "username").unwrap_err();
        assert!(err.to_string().contains("username is required"));
    }

    #[test]
    fn test_required_upload() {
        let allowed = &["png", "jpg"];
        assert!(matches!(
            required_upload(None, "avatar", allowed),
            Err(AppError::UploadRequired("avatar"))
        ));

        let path = PathBuf::from("/tmp/face.PNG");
        assert!(required_upload(Some(path.as_path()), "avatar", allowed).is_ok());

        let path = PathBuf::from("/tmp/face.exe");
        assert!(matches!(
            required_upload(Some(path.as_path()), "avatar", allowed),
            Err(AppError::Validation(_))
        ));
    }
}
