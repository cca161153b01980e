//! Persistence: repository traits, a PostgreSQL implementation and an
//! in-memory implementation with the same atomicity guarantees.

pub mod memory;
pub mod postgres;
mod traits;

pub use memory::MemoryStore;
pub use postgres::{PgAccountRepository, PgSubscriptionRepository, PgVideoRepository};
pub use traits::{AccountRepository, SubscriptionRepository, VideoRepository};

use crate::error::{AppError, Result};
use sqlx::PgPool;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Repository handles shared by every service, plus the per-call deadline
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountRepository>,
    pub videos: Arc<dyn VideoRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    timeout: Duration,
}

impl Repositories {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        videos: Arc<dyn VideoRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        timeout: Duration,
    ) -> Self {
        Self {
            accounts,
            videos,
            subscriptions,
            timeout,
        }
    }

    pub fn postgres(pool: PgPool, timeout: Duration) -> Self {
        Self::new(
            Arc::new(PgAccountRepository::new(pool.clone())),
            Arc::new(PgVideoRepository::new(pool.clone())),
            Arc::new(PgSubscriptionRepository::new(pool)),
            timeout,
        )
    }

    pub fn memory(store: Arc<MemoryStore>, timeout: Duration) -> Self {
        Self::new(store.clone(), store.clone(), store, timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one store call under the configured deadline
    pub async fn run<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Store call timed out"
                );
                Err(AppError::StoreTimeout { operation })
            }
        }
    }
}
