//! Vidora video service core
//!
//! Accounts and sessions, the subscription graph, channel views, catalog
//! search and the video lifecycle. Transport is left to the caller: every
//! operation is a plain async method taking an explicit caller identity.

pub mod blob;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod security;
pub mod services;

pub use config::Settings;
pub use error::{AppError, ErrorKind, Result};
pub use services::AppState;

use anyhow::Context;
use blob::S3BlobStore;
use repository::Repositories;
use s3_utils::S3Client;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

/// Wire the production collaborators: Postgres repositories, S3 blobs and
/// the configured token signer.
pub async fn build_state(settings: &Settings, pool: PgPool) -> anyhow::Result<AppState> {
    let signer = settings
        .jwt
        .signer()
        .context("Failed to initialize token signer")?;
    let s3 = S3Client::with_config(settings.s3.clone()).await;
    s3.health_check()
        .await
        .with_context(|| format!("S3 bucket {} is not reachable", settings.s3.bucket))?;
    let repos = Repositories::postgres(pool, settings.store_timeout);

    info!(
        bucket = %settings.s3.bucket,
        store_timeout_ms = settings.store_timeout.as_millis() as u64,
        "Service state initialized"
    );

    Ok(AppState::new(
        repos,
        Arc::new(S3BlobStore::new(&s3)),
        Arc::new(signer),
    ))
}
