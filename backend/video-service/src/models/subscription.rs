use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Directed subscriber -> channel edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SubscriptionEdge {
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub channel_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Which branch a toggle took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Subscribed,
    Unsubscribed,
}

impl ToggleOutcome {
    pub fn is_subscribed(&self) -> bool {
        matches!(self, ToggleOutcome::Subscribed)
    }
}

/// One neighbour in a subscriber or subscription listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberEntry {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_url: Option<String>,
    /// Subscribers of this neighbour
    pub subscribers_count: i64,
}
