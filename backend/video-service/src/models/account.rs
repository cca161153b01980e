use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;
use video_core::VideoOwner;

/// Stored account row. Holds secrets; never serialize it directly.
#[derive(Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    /// Lower-cased
    pub username: String,
    /// Lower-cased
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub cover_url: Option<String>,
    /// Watched video ids, oldest first
    pub watch_history: Vec<Uuid>,
    /// SHA-256 hex digest of the active refresh token
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("password_hash", &"[REDACTED]")
            .field("avatar_url", &self.avatar_url)
            .field("cover_url", &self.cover_url)
            .field("watch_history", &self.watch_history.len())
            .field(
                "refresh_token_hash",
                &self.refresh_token_hash.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Account {
    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
            cover_url: self.cover_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Reduced projection attached to videos
    pub fn owner_projection(&self) -> VideoOwner {
        VideoOwner {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            account_id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Account with password and token state stripped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller identity resolved from an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub account_id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSlot {
    Avatar,
    Cover,
}

impl MediaSlot {
    pub fn column(&self) -> &'static str {
        match self {
            MediaSlot::Avatar => "avatar_url",
            MediaSlot::Cover => "cover_url",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaSlot::Avatar => "avatar",
            MediaSlot::Cover => "cover",
        }
    }
}

/// Result of swapping an avatar or cover URL
#[derive(Debug, Clone, FromRow)]
pub struct ReplacedMedia {
    #[sqlx(flatten)]
    pub account: Account,
    pub previous_url: Option<String>,
}
