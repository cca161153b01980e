/// Repository seams between the services and the persistent store
use crate::error::Result;
use crate::models::{Account, MediaSlot, NewAccount, ReplacedMedia, SubscriptionEdge};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;
use video_core::{CatalogFilter, CatalogSort, NewVideo, PageRequest, Video, VideoChanges};

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fails with `UsernameAlreadyExists` / `EmailAlreadyExists` on a duplicate
    async fn insert(&self, account: NewAccount) -> Result<Account>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    /// Accounts in no particular order; missing ids are skipped
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Account>>;

    /// Case-insensitive
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// Case-insensitive
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Matches either identifier when both are given
    async fn find_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Account>>;

    /// Unconditionally overwrite the refresh-token slot; false if the account is missing
    async fn set_refresh_token_hash(&self, id: Uuid, hash: Option<String>) -> Result<bool>;

    /// Replace the slot only while it still holds `expected`
    async fn swap_refresh_token_hash(&self, id: Uuid, expected: &str, new: &str) -> Result<bool>;

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool>;

    /// Atomically store a new media URL and return the one it replaced
    async fn replace_media(
        &self,
        id: Uuid,
        slot: MediaSlot,
        url: &str,
    ) -> Result<Option<ReplacedMedia>>;

    /// Append `video_id` to the history; earlier entries are never rewritten
    async fn push_watch_history(&self, id: Uuid, video_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn insert(&self, video: NewVideo) -> Result<Video>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Video>>;

    /// One page of matches plus the total match count
    async fn search(
        &self,
        filter: &CatalogFilter,
        sort: CatalogSort,
        page: PageRequest,
    ) -> Result<(Vec<Video>, u64)>;

    /// The owner guard is part of the write; `None` when no row matched
    async fn update(&self, id: Uuid, owner_id: Uuid, changes: &VideoChanges)
        -> Result<Option<Video>>;

    async fn toggle_published(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Video>>;

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Video>>;

    async fn increment_views(&self, id: Uuid) -> Result<Option<Video>>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Fails with `DuplicateSubscription` when the pair already exists
    async fn insert_edge(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<SubscriptionEdge>;

    /// Atomic find-and-delete of the exact pair
    async fn delete_edge(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool>;

    async fn edge_exists(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool>;

    async fn count_subscribers(&self, channel_id: Uuid) -> Result<i64>;

    async fn count_subscriptions(&self, subscriber_id: Uuid) -> Result<i64>;

    /// Subscriber ids in edge creation order
    async fn subscriber_ids(&self, channel_id: Uuid) -> Result<Vec<Uuid>>;

    /// Channel ids in edge creation order
    async fn subscription_ids(&self, subscriber_id: Uuid) -> Result<Vec<Uuid>>;

    /// In-degree per channel; channels without subscribers are absent
    async fn subscriber_counts(&self, channel_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>>;
}
