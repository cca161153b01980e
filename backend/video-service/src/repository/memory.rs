/// In-memory store implementing every repository trait
///
/// Each trait method takes the lock once, so the conditional operations
/// (refresh-token swap, edge find-and-delete, unique edge insert) are atomic
/// just as the SQL statements are. The same uniqueness and self-edge rules the
/// schema enforces are checked here and reported with the same errors.
use crate::error::{AppError, Result};
use crate::models::{Account, MediaSlot, NewAccount, ReplacedMedia, SubscriptionEdge};
use crate::repository::{AccountRepository, SubscriptionRepository, VideoRepository};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use video_core::{CatalogFilter, CatalogSort, NewVideo, PageRequest, Video, VideoChanges};

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<Uuid, Account>,
    videos: HashMap<Uuid, Video>,
    /// Insertion order is edge creation order
    subscriptions: Vec<SubscriptionEdge>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn account_count(&self) -> usize {
        self.state.read().await.accounts.len()
    }

    pub async fn video_count(&self) -> usize {
        self.state.read().await.videos.len()
    }

    pub async fn edge_count(&self) -> usize {
        self.state.read().await.subscriptions.len()
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn insert(&self, account: NewAccount) -> Result<Account> {
        let mut state = self.state.write().await;
        let username = account.username.to_lowercase();
        let email = account.email.to_lowercase();

        if state.accounts.values().any(|a| a.username == username) {
            return Err(AppError::UsernameAlreadyExists);
        }
        if state.accounts.values().any(|a| a.email == email) {
            return Err(AppError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let record = Account {
            id: Uuid::new_v4(),
            username,
            email,
            full_name: account.full_name,
            password_hash: account.password_hash,
            avatar_url: account.avatar_url,
            cover_url: account.cover_url,
            watch_history: Vec::new(),
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.state.read().await.accounts.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Account>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.accounts.get(id).cloned())
            .collect())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let username = username.to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let email = email.to_lowercase();
        let state = self.state.read().await;
        Ok(state.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Account>> {
        let username = username.map(str::to_lowercase);
        let email = email.map(str::to_lowercase);
        let state = self.state.read().await;

        // Oldest match wins, as in the SQL lookup
        Ok(state
            .accounts
            .values()
            .filter(|a| {
                username.as_deref() == Some(a.username.as_str())
                    || email.as_deref() == Some(a.email.as_str())
            })
            .min_by_key(|a| (a.created_at, a.id))
            .cloned())
    }

    async fn set_refresh_token_hash(&self, id: Uuid, hash: Option<String>) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.accounts.get_mut(&id) {
            Some(account) => {
                account.refresh_token_hash = hash;
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn swap_refresh_token_hash(&self, id: Uuid, expected: &str, new: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.accounts.get_mut(&id) {
            Some(account) if account.refresh_token_hash.as_deref() == Some(expected) => {
                account.refresh_token_hash = Some(new.to_string());
                account.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.accounts.get_mut(&id) {
            Some(account) => {
                account.password_hash = password_hash.to_string();
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn replace_media(
        &self,
        id: Uuid,
        slot: MediaSlot,
        url: &str,
    ) -> Result<Option<ReplacedMedia>> {
        let mut state = self.state.write().await;
        let Some(account) = state.accounts.get_mut(&id) else {
            return Ok(None);
        };

        let previous_url = match slot {
            MediaSlot::Avatar => Some(std::mem::replace(&mut account.avatar_url, url.to_string())),
            MediaSlot::Cover => account.cover_url.replace(url.to_string()),
        };
        account.updated_at = Utc::now();

        Ok(Some(ReplacedMedia {
            account: account.clone(),
            previous_url,
        }))
    }

    async fn push_watch_history(&self, id: Uuid, video_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.accounts.get_mut(&id) {
            Some(account) => {
                account.watch_history.push(video_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl VideoRepository for MemoryStore {
    async fn insert(&self, video: NewVideo) -> Result<Video> {
        let mut state = self.state.write().await;
        if !state.accounts.contains_key(&video.owner_id) {
            return Err(AppError::not_found("Referenced account"));
        }

        let now = Utc::now();
        let record = Video {
            id: Uuid::new_v4(),
            owner_id: video.owner_id,
            title: video.title,
            description: video.description,
            video_url: video.video_url,
            thumbnail_url: video.thumbnail_url,
            duration: video.duration,
            views: 0,
            is_published: video.is_published,
            created_at: now,
            updated_at: now,
        };
        state.videos.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>> {
        Ok(self.state.read().await.videos.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Video>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.videos.get(id).cloned())
            .collect())
    }

    async fn search(
        &self,
        filter: &CatalogFilter,
        sort: CatalogSort,
        page: PageRequest,
    ) -> Result<(Vec<Video>, u64)> {
        let state = self.state.read().await;
        let mut matches: Vec<&Video> = state.videos.values().filter(|v| filter.matches(v)).collect();
        matches.sort_by(|a, b| sort.compare(a, b));

        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();

        Ok((items, total))
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: &VideoChanges,
    ) -> Result<Option<Video>> {
        let mut state = self.state.write().await;
        match state.videos.get_mut(&id) {
            Some(video) if video.is_owned_by(owner_id) => {
                changes.apply_to(video);
                video.updated_at = Utc::now();
                Ok(Some(video.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn toggle_published(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Video>> {
        let mut state = self.state.write().await;
        match state.videos.get_mut(&id) {
            Some(video) if video.is_owned_by(owner_id) => {
                video.is_published = !video.is_published;
                video.updated_at = Utc::now();
                Ok(Some(video.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Video>> {
        let mut state = self.state.write().await;
        let owned = state
            .videos
            .get(&id)
            .is_some_and(|video| video.is_owned_by(owner_id));
        if owned {
            Ok(state.videos.remove(&id))
        } else {
            Ok(None)
        }
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<Video>> {
        let mut state = self.state.write().await;
        Ok(state.videos.get_mut(&id).map(|video| {
            video.views += 1;
            video.clone()
        }))
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn insert_edge(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<SubscriptionEdge> {
        let mut state = self.state.write().await;
        if subscriber_id == channel_id {
            return Err(AppError::SelfSubscription);
        }
        if !state.accounts.contains_key(&subscriber_id) || !state.accounts.contains_key(&channel_id)
        {
            return Err(AppError::not_found("Referenced account"));
        }
        if state
            .subscriptions
            .iter()
            .any(|e| e.subscriber_id == subscriber_id && e.channel_id == channel_id)
        {
            return Err(AppError::DuplicateSubscription);
        }

        let edge = SubscriptionEdge {
            id: Uuid::new_v4(),
            subscriber_id,
            channel_id,
            created_at: Utc::now(),
        };
        state.subscriptions.push(edge.clone());
        Ok(edge)
    }

    async fn delete_edge(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.subscriptions.len();
        state
            .subscriptions
            .retain(|e| !(e.subscriber_id == subscriber_id && e.channel_id == channel_id));
        Ok(state.subscriptions.len() != before)
    }

    async fn edge_exists(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .iter()
            .any(|e| e.subscriber_id == subscriber_id && e.channel_id == channel_id))
    }

    async fn count_subscribers(&self, channel_id: Uuid) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .iter()
            .filter(|e| e.channel_id == channel_id)
            .count() as i64)
    }

    async fn count_subscriptions(&self, subscriber_id: Uuid) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .iter()
            .filter(|e| e.subscriber_id == subscriber_id)
            .count() as i64)
    }

    async fn subscriber_ids(&self, channel_id: Uuid) -> Result<Vec<Uuid>> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .iter()
            .filter(|e| e.channel_id == channel_id)
            .map(|e| e.subscriber_id)
            .collect())
    }

    async fn subscription_ids(&self, subscriber_id: Uuid) -> Result<Vec<Uuid>> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .iter()
            .filter(|e| e.subscriber_id == subscriber_id)
            .map(|e| e.channel_id)
            .collect())
    }

    async fn subscriber_counts(&self, channel_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        let state = self.state.read().await;
        let mut counts = HashMap::new();
        for edge in &state.subscriptions {
            if channel_ids.contains(&edge.channel_id) {
                *counts.entry(edge.channel_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(name: &str) -> NewAccount {
        NewAccount {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            full_name: name.to_string(),
            password_hash: "hash".to_string(),
            avatar_url: format!("memory://{name}.png"),
            cover_url: None,
        }
    }

    #[tokio::test]
    async fn test_account_uniqueness_is_case_insensitive() {
        let store = MemoryStore::new();
        AccountRepository::insert(&store, new_account("alice")).await.unwrap();

        let err = AccountRepository::insert(&store, new_account("ALICE"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UsernameAlreadyExists));

        let mut other = new_account("bob");
        other.email = "Alice@Example.com".to_string();
        let err = AccountRepository::insert(&store, other).await.unwrap_err();
        assert!(matches!(err, AppError::EmailAlreadyExists));
    }

    #[tokio::test]
    async fn test_swap_refresh_token_only_from_expected() {
        let store = MemoryStore::new();
        let account = AccountRepository::insert(&store, new_account("alice")).await.unwrap();
        store
            .set_refresh_token_hash(account.id, Some("first".to_string()))
            .await
            .unwrap();

        assert!(store
            .swap_refresh_token_hash(account.id, "first", "second")
            .await
            .unwrap());
        assert!(!store
            .swap_refresh_token_hash(account.id, "first", "third")
            .await
            .unwrap());

        let stored = AccountRepository::find_by_id(&store, account.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.refresh_token_hash.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_edge_rules_match_schema() {
        let store = MemoryStore::new();
        let a = AccountRepository::insert(&store, new_account("alice")).await.unwrap();
        let b = AccountRepository::insert(&store, new_account("bob")).await.unwrap();

        assert!(matches!(
            store.insert_edge(a.id, a.id).await,
            Err(AppError::SelfSubscription)
        ));
        store.insert_edge(a.id, b.id).await.unwrap();
        assert!(matches!(
            store.insert_edge(a.id, b.id).await,
            Err(AppError::DuplicateSubscription)
        ));
        assert!(store.delete_edge(a.id, b.id).await.unwrap());
        assert!(!store.delete_edge(a.id, b.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_watch_history_keeps_repeats() {
        let store = MemoryStore::new();
        let account = AccountRepository::insert(&store, new_account("alice")).await.unwrap();
        let (v1, v2) = (Uuid::new_v4(), Uuid::new_v4());

        for id in [v1, v2, v1] {
            store.push_watch_history(account.id, id).await.unwrap();
        }

        let stored = AccountRepository::find_by_id(&store, account.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.watch_history, vec![v1, v2, v1]);
    }

    #[tokio::test]
    async fn test_login_lookup_prefers_oldest_match() {
        let store = MemoryStore::new();
        let alice = AccountRepository::insert(&store, new_account("alice")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let bob = AccountRepository::insert(&store, new_account("bob")).await.unwrap();

        for _ in 0..5 {
            let found = store
                .find_by_login(Some("bob"), Some("ALICE@example.com"))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(found.id, alice.id);
        }

        let found = store
            .find_by_login(None, Some("bob@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, bob.id);
    }

    #[tokio::test]
    async fn test_replace_cover_returns_none_when_unset() {
        let store = MemoryStore::new();
        let account = AccountRepository::insert(&store, new_account("alice")).await.unwrap();

        let replaced = store
            .replace_media(account.id, MediaSlot::Cover, "memory://cover.png")
            .await
            .unwrap()
            .unwrap();
        assert!(replaced.previous_url.is_none());
        assert_eq!(replaced.account.cover_url.as_deref(), Some("memory://cover.png"));

        let missing = store
            .replace_media(Uuid::new_v4(), MediaSlot::Avatar, "memory://x.png")
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
