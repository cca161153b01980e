//! Video lifecycle: publish, read, edit, delete, publish toggle, view counting
//!
//! Mutations are owner-only. The owner guard is repeated inside each store
//! write, so a concurrent ownership check and write cannot interleave into a
//! foreign edit. Blobs follow the store: a new blob is uploaded before the
//! record points at it and an old blob is deleted only after the record no
//! longer does.

use crate::blob::{delete_orphan, BlobStore};
use crate::error::{AppError, Result};
use crate::models::Identity;
use crate::repository::Repositories;
use crate::services::{required_text, required_upload, summarize};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use video_core::constants::{
    ALLOWED_IMAGE_EXTENSIONS, ALLOWED_VIDEO_EXTENSIONS, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH,
};
use video_core::{NewVideo, Video, VideoChanges, VideoSummary};

#[derive(Debug, Clone, Default)]
pub struct PublishVideo {
    pub title: String,
    pub description: String,
    /// Local media file
    pub video: Option<PathBuf>,
    /// Local image file
    pub thumbnail: Option<PathBuf>,
}

/// `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<PathBuf>,
}

/// Receipt for a deleted video
#[derive(Debug, Clone, Serialize)]
pub struct DeletedVideo {
    pub video: VideoSummary,
    pub deleted_by: Uuid,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct VideoService {
    repos: Repositories,
    blobs: Arc<dyn BlobStore>,
}

impl VideoService {
    pub fn new(repos: Repositories, blobs: Arc<dyn BlobStore>) -> Self {
        Self { repos, blobs }
    }

    pub async fn publish(&self, identity: &Identity, request: PublishVideo) -> Result<VideoSummary> {
        let title = validated_title(&request.title)?;
        let description = validated_description(&request.description)?;
        let video_path =
            required_upload(request.video.as_deref(), "video", ALLOWED_VIDEO_EXTENSIONS)?;
        let thumbnail_path = required_upload(
            request.thumbnail.as_deref(),
            "thumbnail",
            ALLOWED_IMAGE_EXTENSIONS,
        )?;

        let owner = self
            .repos
            .run(
                "accounts.find_by_id",
                self.repos.accounts.find_by_id(identity.account_id),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Account"))?;

        let media = self.blobs.upload(video_path).await?;
        let thumbnail = match self.blobs.upload(thumbnail_path).await {
            Ok(blob) => blob,
            Err(e) => {
                delete_orphan(self.blobs.as_ref(), &media.url, "publish failed").await;
                return Err(e);
            }
        };

        let new_video = NewVideo {
            owner_id: owner.id,
            title,
            description,
            video_url: media.url.clone(),
            thumbnail_url: thumbnail.url.clone(),
            duration: media.duration.unwrap_or(0.0),
            is_published: true,
        };

        let video = match self
            .repos
            .run("videos.insert", self.repos.videos.insert(new_video))
            .await
        {
            Ok(video) => video,
            Err(e) => {
                delete_orphan(self.blobs.as_ref(), &media.url, "publish failed").await;
                delete_orphan(self.blobs.as_ref(), &thumbnail.url, "publish failed").await;
                return Err(e);
            }
        };

        info!(video_id = %video.id, owner_id = %owner.id, "Video published");
        Ok(VideoSummary::new(video, owner.owner_projection()))
    }

    /// Drafts are reported as missing to everyone but their owner
    pub async fn get(&self, viewer_id: Option<Uuid>, video_id: Uuid) -> Result<VideoSummary> {
        let video = self
            .find(video_id)
            .await?
            .filter(|video| video.is_visible_to(viewer_id))
            .ok_or_else(|| AppError::not_found("Video"))?;

        self.summary(video).await
    }

    pub async fn update(
        &self,
        identity: &Identity,
        video_id: Uuid,
        request: UpdateVideo,
    ) -> Result<VideoSummary> {
        let title = request.title.as_deref().map(validated_title).transpose()?;
        let description = request
            .description
            .as_deref()
            .map(validated_description)
            .transpose()?;
        let thumbnail_path = request
            .thumbnail
            .as_deref()
            .map(|path| required_upload(Some(path), "thumbnail", ALLOWED_IMAGE_EXTENSIONS))
            .transpose()?;
        if title.is_none() && description.is_none() && thumbnail_path.is_none() {
            return Err(AppError::validation("nothing to update"));
        }

        let current = self.owned(identity, video_id).await?;

        let thumbnail = match thumbnail_path {
            Some(path) => Some(self.blobs.upload(path).await?),
            None => None,
        };
        let changes = VideoChanges {
            title,
            description,
            thumbnail_url: thumbnail.as_ref().map(|blob| blob.url.clone()),
        };

        let updated = match self
            .repos
            .run(
                "videos.update",
                self.repos
                    .videos
                    .update(video_id, identity.account_id, &changes),
            )
            .await
        {
            Ok(Some(video)) => video,
            Ok(None) => {
                if let Some(blob) = &thumbnail {
                    delete_orphan(self.blobs.as_ref(), &blob.url, "video vanished").await;
                }
                return Err(AppError::not_found("Video"));
            }
            Err(e) => {
                if let Some(blob) = &thumbnail {
                    delete_orphan(self.blobs.as_ref(), &blob.url, "video update failed").await;
                }
                return Err(e);
            }
        };

        if thumbnail.is_some() && current.thumbnail_url != updated.thumbnail_url {
            delete_orphan(self.blobs.as_ref(), &current.thumbnail_url, "replaced").await;
        }

        info!(%video_id, owner_id = %identity.account_id, "Video updated");
        self.summary(updated).await
    }

    /// Store delete first; blob deletes afterwards never fail the call
    pub async fn delete(&self, identity: &Identity, video_id: Uuid) -> Result<DeletedVideo> {
        let current = self.owned(identity, video_id).await?;
        let summary = self.summary(current).await?;

        let removed = self
            .repos
            .run(
                "videos.delete",
                self.repos.videos.delete(video_id, identity.account_id),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Video"))?;

        delete_orphan(self.blobs.as_ref(), &removed.video_url, "video deleted").await;
        delete_orphan(self.blobs.as_ref(), &removed.thumbnail_url, "video deleted").await;

        info!(%video_id, owner_id = %identity.account_id, "Video deleted");
        Ok(DeletedVideo {
            video: summary,
            deleted_by: identity.account_id,
            deleted_at: Utc::now(),
        })
    }

    pub async fn toggle_publish(&self, identity: &Identity, video_id: Uuid) -> Result<VideoSummary> {
        self.owned(identity, video_id).await?;

        let video = self
            .repos
            .run(
                "videos.toggle_published",
                self.repos
                    .videos
                    .toggle_published(video_id, identity.account_id),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Video"))?;

        info!(%video_id, is_published = video.is_published, "Video publish state toggled");
        self.summary(video).await
    }

    /// Append the video to the viewer's history, then count the view.
    ///
    /// The history write goes first so a counted view always has its history
    /// entry; a failed count leaves the entry and reports the error.
    pub async fn record_view(&self, identity: &Identity, video_id: Uuid) -> Result<VideoSummary> {
        let visible = self
            .find(video_id)
            .await?
            .is_some_and(|video| video.is_visible_to(Some(identity.account_id)));
        if !visible {
            return Err(AppError::not_found("Video"));
        }

        let recorded = self
            .repos
            .run(
                "accounts.push_watch_history",
                self.repos
                    .accounts
                    .push_watch_history(identity.account_id, video_id),
            )
            .await?;
        if !recorded {
            return Err(AppError::not_found("Account"));
        }

        let video = self
            .repos
            .run(
                "videos.increment_views",
                self.repos.videos.increment_views(video_id),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Video"))?;

        self.summary(video).await
    }

    async fn find(&self, video_id: Uuid) -> Result<Option<Video>> {
        self.repos
            .run("videos.find_by_id", self.repos.videos.find_by_id(video_id))
            .await
    }

    async fn owned(&self, identity: &Identity, video_id: Uuid) -> Result<Video> {
        let video = self
            .find(video_id)
            .await?
            .ok_or_else(|| AppError::not_found("Video"))?;

        if !video.is_owned_by(identity.account_id) {
            tracing::warn!(
                %video_id,
                account_id = %identity.account_id,
                "Rejected mutation by non-owner"
            );
            return Err(AppError::NotVideoOwner);
        }
        Ok(video)
    }

    async fn summary(&self, video: Video) -> Result<VideoSummary> {
        summarize(&self.repos, vec![video])
            .await?
            .pop()
            .ok_or_else(|| AppError::not_found("Video owner"))
    }
}

fn validated_title(title: &str) -> Result<String> {
    let title = required_text(title, "title")?;
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::validation(format!(
            "title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(title)
}

fn validated_description(description: &str) -> Result<String> {
    let description = required_text(description, "description")?;
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(AppError::validation(format!(
            "description must be at most {MAX_DESCRIPTION_LENGTH} characters"
        )));
    }
    Ok(description)
}
