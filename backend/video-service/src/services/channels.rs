//! Channel pages and watch history composed from accounts, edges and videos

use crate::error::{AppError, Result};
use crate::models::{ChannelProfile, Identity};
use crate::repository::Repositories;
use crate::services::{required_text, summarize};
use std::collections::HashMap;
use uuid::Uuid;
use video_core::{Video, VideoSummary};

#[derive(Clone)]
pub struct ChannelService {
    repos: Repositories,
}

impl ChannelService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// `is_subscribed` is false when there is no viewer
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer_id: Option<Uuid>,
    ) -> Result<ChannelProfile> {
        let username = required_text(username, "username")?.to_lowercase();
        let channel = self
            .repos
            .run(
                "accounts.find_by_username",
                self.repos.accounts.find_by_username(&username),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Channel"))?;

        let subscriptions = &self.repos.subscriptions;
        let is_subscribed = async {
            match viewer_id {
                Some(viewer_id) => {
                    self.repos
                        .run(
                            "subscriptions.edge_exists",
                            subscriptions.edge_exists(viewer_id, channel.id),
                        )
                        .await
                }
                None => Ok(false),
            }
        };

        let (subscribers_count, subscribed_to_count, is_subscribed) = futures::try_join!(
            self.repos.run(
                "subscriptions.count_subscribers",
                subscriptions.count_subscribers(channel.id),
            ),
            self.repos.run(
                "subscriptions.count_subscriptions",
                subscriptions.count_subscriptions(channel.id),
            ),
            is_subscribed,
        )?;

        Ok(ChannelProfile {
            id: channel.id,
            full_name: channel.full_name,
            username: channel.username,
            email: channel.email,
            avatar_url: channel.avatar_url,
            cover_url: channel.cover_url,
            subscribers_count,
            subscribed_to_count,
            is_subscribed,
        })
    }

    /// Videos in stored history order, each joined with its owner.
    ///
    /// Repeat views appear once per view. Ids whose video was deleted, or is
    /// now a draft of someone else, are skipped.
    pub async fn watch_history(&self, identity: &Identity) -> Result<Vec<VideoSummary>> {
        let account = self
            .repos
            .run(
                "accounts.find_by_id",
                self.repos.accounts.find_by_id(identity.account_id),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Account"))?;

        if account.watch_history.is_empty() {
            return Ok(Vec::new());
        }

        let videos: HashMap<Uuid, Video> = self
            .repos
            .run(
                "videos.find_by_ids",
                self.repos.videos.find_by_ids(&account.watch_history),
            )
            .await?
            .into_iter()
            .map(|video| (video.id, video))
            .collect();

        let ordered: Vec<Video> = account
            .watch_history
            .iter()
            .filter_map(|id| videos.get(id).cloned())
            .filter(|video| video.is_visible_to(Some(account.id)))
            .collect();

        summarize(&self.repos, ordered).await
    }
}
