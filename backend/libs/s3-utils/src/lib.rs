/// Shared S3 utilities for Vidora services
///
/// Provides the AWS S3 client, configuration, and the upload/delete
/// operations used by the media blob store.
use aws_sdk_s3::Client;
use std::sync::Arc;

pub mod config;
pub mod operations;

pub use config::S3Config;
pub use operations::{S3Operations, UploadedObject};

#[derive(Debug, thiserror::Error)]
pub enum S3Error {
    #[error("failed to read local file {path}: {message}")]
    LocalFile { path: String, message: String },

    #[error("upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    #[error("delete of {key} failed: {message}")]
    Delete { key: String, message: String },

    #[error("url does not belong to bucket {bucket}: {url}")]
    ForeignUrl { bucket: String, url: String },

    #[error("bucket check failed: {0}")]
    Unreachable(String),
}

pub type Result<T> = std::result::Result<T, S3Error>;

/// Shared S3 client wrapper
#[derive(Clone)]
pub struct S3Client {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Client {
    /// Create new S3 client with configuration from environment
    pub async fn new() -> Self {
        Self::with_config(S3Config::from_env()).await
    }

    /// Create new S3 client with custom configuration
    pub async fn with_config(config: S3Config) -> Self {
        let aws_config = aws_config::load_from_env().await;
        let client = Client::new(&aws_config);

        Self {
            client: Arc::new(client),
            config,
        }
    }

    /// Get reference to underlying AWS S3 client
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }

    pub fn operations(&self) -> S3Operations {
        S3Operations::new(self.client.clone(), self.config.clone())
    }

    /// Health check for S3 connectivity
    pub async fn health_check(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|e| S3Error::Unreachable(e.to_string()))?;

        Ok(())
    }
}
