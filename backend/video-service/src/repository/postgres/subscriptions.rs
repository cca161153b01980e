use crate::error::Result;
use crate::models::SubscriptionEdge;
use crate::repository::SubscriptionRepository;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// PostgreSQL subscription graph. `subscriptions_pair_key` and
/// `subscriptions_no_self` back the toggle's own checks.
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn insert_edge(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<SubscriptionEdge> {
        let edge = sqlx::query_as::<_, SubscriptionEdge>(
            r#"
            INSERT INTO subscriptions (id, subscriber_id, channel_id)
            VALUES ($1, $2, $3)
            RETURNING id, subscriber_id, channel_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;

        debug!(%subscriber_id, %channel_id, "Inserted subscription edge");
        Ok(edge)
    }

    async fn delete_edge(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2")
                .bind(subscriber_id)
                .bind(channel_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn edge_exists(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2
            )
            "#,
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn count_subscribers(&self, channel_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE channel_id = $1")
                .bind(channel_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn count_subscriptions(&self, subscriber_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = $1")
                .bind(subscriber_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn subscriber_ids(&self, channel_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar(
            r#"
            SELECT subscriber_id FROM subscriptions
            WHERE channel_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn subscription_ids(&self, subscriber_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar(
            r#"
            SELECT channel_id FROM subscriptions
            WHERE subscriber_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn subscriber_counts(&self, channel_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        if channel_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT channel_id, COUNT(*) FROM subscriptions
            WHERE channel_id = ANY($1)
            GROUP BY channel_id
            "#,
        )
        .bind(channel_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}
