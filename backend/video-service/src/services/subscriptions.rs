//! Relationship graph: toggling and listing subscriber -> channel edges

use crate::error::{AppError, Result};
use crate::models::{Account, Identity, SubscriberEntry, ToggleOutcome};
use crate::repository::Repositories;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct SubscriptionService {
    repos: Repositories,
}

impl SubscriptionService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Delete the edge if present, otherwise create it
    pub async fn toggle(&self, identity: &Identity, channel_id: Uuid) -> Result<ToggleOutcome> {
        let subscriber_id = identity.account_id;
        if subscriber_id == channel_id {
            return Err(AppError::SelfSubscription);
        }
        self.require_account(channel_id, "Channel").await?;

        let removed = self
            .repos
            .run(
                "subscriptions.delete_edge",
                self.repos.subscriptions.delete_edge(subscriber_id, channel_id),
            )
            .await?;

        let outcome = if removed {
            ToggleOutcome::Unsubscribed
        } else {
            match self
                .repos
                .run(
                    "subscriptions.insert_edge",
                    self.repos.subscriptions.insert_edge(subscriber_id, channel_id),
                )
                .await
            {
                Ok(_) => ToggleOutcome::Subscribed,
                // A concurrent toggle created the edge first
                Err(AppError::DuplicateSubscription) => {
                    debug!(%subscriber_id, %channel_id, "Edge already present after concurrent toggle");
                    ToggleOutcome::Subscribed
                }
                Err(e) => return Err(e),
            }
        };

        info!(
            %subscriber_id,
            %channel_id,
            subscribed = outcome.is_subscribed(),
            "Subscription toggled"
        );
        Ok(outcome)
    }

    /// Accounts subscribed to `channel_id`, each with its own subscriber count
    pub async fn list_subscribers(&self, channel_id: Uuid) -> Result<Vec<SubscriberEntry>> {
        self.require_account(channel_id, "Channel").await?;
        let ids = self
            .repos
            .run(
                "subscriptions.subscriber_ids",
                self.repos.subscriptions.subscriber_ids(channel_id),
            )
            .await?;
        self.entries(ids).await
    }

    /// Channels `subscriber_id` subscribes to, each with its subscriber count
    pub async fn list_subscriptions(&self, subscriber_id: Uuid) -> Result<Vec<SubscriberEntry>> {
        self.require_account(subscriber_id, "Subscriber").await?;
        let ids = self
            .repos
            .run(
                "subscriptions.subscription_ids",
                self.repos.subscriptions.subscription_ids(subscriber_id),
            )
            .await?;
        self.entries(ids).await
    }

    async fn require_account(&self, id: Uuid, what: &str) -> Result<()> {
        self.repos
            .run("accounts.find_by_id", self.repos.accounts.find_by_id(id))
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(what))
    }

    /// Batch-load the neighbours, then one grouped count over them
    async fn entries(&self, ids: Vec<Uuid>) -> Result<Vec<SubscriberEntry>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let accounts: HashMap<Uuid, Account> = self
            .repos
            .run("accounts.find_by_ids", self.repos.accounts.find_by_ids(&ids))
            .await?
            .into_iter()
            .map(|account| (account.id, account))
            .collect();
        let counts = self
            .repos
            .run(
                "subscriptions.subscriber_counts",
                self.repos.subscriptions.subscriber_counts(&ids),
            )
            .await?;

        Ok(ids
            .iter()
            .filter_map(|id| accounts.get(id))
            .map(|account| SubscriberEntry {
                id: account.id,
                username: account.username.clone(),
                full_name: account.full_name.clone(),
                avatar_url: account.avatar_url.clone(),
                cover_url: account.cover_url.clone(),
                subscribers_count: counts.get(&account.id).copied().unwrap_or(0),
            })
            .collect())
    }
}
