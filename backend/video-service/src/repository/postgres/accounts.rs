use crate::error::Result;
use crate::models::{Account, MediaSlot, NewAccount, ReplacedMedia};
use crate::repository::AccountRepository;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

const ACCOUNT_COLUMNS: &str = "id, username, email, full_name, password_hash, avatar_url, \
     cover_url, watch_history, refresh_token_hash, created_at, updated_at";

/// PostgreSQL account storage
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn insert(&self, account: NewAccount) -> Result<Account> {
        let query = format!(
            r#"
            INSERT INTO accounts (id, username, email, full_name, password_hash, avatar_url, cover_url)
            VALUES ($1, lower($2), lower($3), $4, $5, $6, $7)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );

        let record = sqlx::query_as::<_, Account>(&query)
            .bind(Uuid::new_v4())
            .bind(&account.username)
            .bind(&account.email)
            .bind(&account.full_name)
            .bind(&account.password_hash)
            .bind(&account.avatar_url)
            .bind(&account.cover_url)
            .fetch_one(&self.pool)
            .await?;

        debug!(account_id = %record.id, "Inserted account");
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let account = sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Account>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ANY($1)");
        let accounts = sqlx::query_as::<_, Account>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(accounts)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = lower($1)");
        let account = sqlx::query_as::<_, Account>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = lower($1)");
        let account = sqlx::query_as::<_, Account>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn find_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Account>> {
        let query = format!(
            r#"
            SELECT {ACCOUNT_COLUMNS} FROM accounts
            WHERE ($1::text IS NOT NULL AND username = lower($1))
               OR ($2::text IS NOT NULL AND email = lower($2))
            ORDER BY created_at
            LIMIT 1
            "#
        );

        let account = sqlx::query_as::<_, Account>(&query)
            .bind(username)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn set_refresh_token_hash(&self, id: Uuid, hash: Option<String>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE accounts SET refresh_token_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn swap_refresh_token_hash(&self, id: Uuid, expected: &str, new: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET refresh_token_hash = $3, updated_at = NOW()
            WHERE id = $1 AND refresh_token_hash = $2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(new)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE accounts SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn replace_media(
        &self,
        id: Uuid,
        slot: MediaSlot,
        url: &str,
    ) -> Result<Option<ReplacedMedia>> {
        let column = slot.column();
        let query = format!(
            r#"
            WITH previous AS (
                SELECT id, {column} AS previous_url FROM accounts WHERE id = $1 FOR UPDATE
            )
            UPDATE accounts a
            SET {column} = $2, updated_at = NOW()
            FROM previous p
            WHERE a.id = p.id
            RETURNING a.*, p.previous_url
            "#
        );

        let replaced = sqlx::query_as::<_, ReplacedMedia>(&query)
            .bind(id)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;

        Ok(replaced)
    }

    async fn push_watch_history(&self, id: Uuid, video_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET watch_history = array_append(watch_history, $2),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(video_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
