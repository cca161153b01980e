//! Core video data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored video record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    /// Blob store URL of the media file
    pub video_url: String,
    pub thumbnail_url: String,
    /// Length in seconds as reported by the blob store
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn is_owned_by(&self, account_id: Uuid) -> bool {
        self.owner_id == account_id
    }

    /// Published videos are visible to everyone, drafts only to their owner
    pub fn is_visible_to(&self, viewer: Option<Uuid>) -> bool {
        self.is_published || viewer.map_or(false, |id| self.is_owned_by(id))
    }
}

/// Reduced owner projection joined onto video results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct VideoOwner {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
}

/// Video joined with its owner, as returned by catalog and history queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub owner: VideoOwner,
}

impl VideoSummary {
    pub fn new(video: Video, owner: VideoOwner) -> Self {
        Self {
            id: video.id,
            title: video.title,
            description: video.description,
            video_url: video.video_url,
            thumbnail_url: video.thumbnail_url,
            duration: video.duration,
            views: video.views,
            is_published: video.is_published,
            created_at: video.created_at,
            owner,
        }
    }
}

/// Fields required to insert a video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVideo {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub is_published: bool,
}

/// Partial update of video metadata; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl VideoChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.thumbnail_url.is_none()
    }

    /// Apply to an in-memory record
    pub fn apply_to(&self, video: &mut Video) {
        if let Some(title) = &self.title {
            video.title = title.clone();
        }
        if let Some(description) = &self.description {
            video.description = description.clone();
        }
        if let Some(thumbnail_url) = &self.thumbnail_url {
            video.thumbnail_url = thumbnail_url.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(owner_id: Uuid, is_published: bool) -> Video {
        let now = Utc::now();
        Video {
            id: Uuid::new_v4(),
            owner_id,
            title: "Title".to_string(),
            description: "Description".to_string(),
            video_url: "https://cdn.example.com/v.mp4".to_string(),
            thumbnail_url: "https://cdn.example.com/t.png".to_string(),
            duration: 12.5,
            views: 0,
            is_published,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_draft_visible_only_to_owner() {
        let owner = Uuid::new_v4();
        let draft = video(owner, false);

        assert!(draft.is_visible_to(Some(owner)));
        assert!(!draft.is_visible_to(Some(Uuid::new_v4())));
        assert!(!draft.is_visible_to(None));
        assert!(video(owner, true).is_visible_to(None));
    }

    #[test]
    fn test_changes_apply_only_set_fields() {
        let mut v = video(Uuid::new_v4(), true);
        let changes = VideoChanges {
            title: Some("New".to_string()),
            ..Default::default()
        };
        changes.apply_to(&mut v);

        assert_eq!(v.title, "New");
        assert_eq!(v.description, "Description");
        assert!(!changes.is_empty());
        assert!(VideoChanges::default().is_empty());
    }
}
