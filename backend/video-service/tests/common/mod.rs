//! Shared fixtures: services wired to the in-memory store and blob store
#![allow(dead_code)]

use crypto_core::JwtSigner;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;
use video_core::VideoSummary;
use video_service::blob::MemoryBlobStore;
use video_service::models::{AccountView, Identity};
use video_service::repository::{MemoryStore, Repositories};
use video_service::services::{LoginOutcome, LoginRequest, PublishVideo, RegisterRequest};
use video_service::AppState;

pub const PASSWORD: &str = "correct-horse-42";
pub const SECRET: &[u8] = b"integration-test-secret-at-least-32-bytes";

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub signer: Arc<JwtSigner>,
    uploads: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobStore::new(93.5));
        let signer = Arc::new(JwtSigner::from_secret(SECRET).expect("valid test secret"));
        let repos = Repositories::memory(store.clone(), Duration::from_secs(2));

        Self {
            state: AppState::new(repos, blobs.clone(), signer.clone()),
            store,
            blobs,
            signer,
            uploads: tempfile::tempdir().expect("temp dir"),
        }
    }

    /// A local file standing in for a multipart upload
    pub fn upload(&self, extension: &str) -> PathBuf {
        let path = self
            .uploads
            .path()
            .join(format!("{}.{extension}", Uuid::new_v4()));
        std::fs::write(&path, b"fixture").expect("write upload fixture");
        path
    }

    pub fn register_request(&self, username: &str) -> RegisterRequest {
        RegisterRequest {
            full_name: format!("{username} Example"),
            email: format!("{username}@example.com"),
            username: username.to_string(),
            password: PASSWORD.to_string(),
            avatar: Some(self.upload("png")),
            cover: None,
        }
    }

    pub async fn register(&self, username: &str) -> AccountView {
        self.state
            .sessions
            .register(self.register_request(username))
            .await
            .expect("registration succeeds")
    }

    pub async fn login(&self, username: &str) -> LoginOutcome {
        self.state
            .sessions
            .login(LoginRequest {
                username: Some(username.to_string()),
                email: None,
                password: PASSWORD.to_string(),
            })
            .await
            .expect("login succeeds")
    }

    pub async fn publish(&self, owner: &Identity, title: &str, description: &str) -> VideoSummary {
        self.state
            .videos
            .publish(
                owner,
                PublishVideo {
                    title: title.to_string(),
                    description: description.to_string(),
                    video: Some(self.upload("mp4")),
                    thumbnail: Some(self.upload("jpg")),
                },
            )
            .await
            .expect("publish succeeds")
    }
}

pub fn identity(account: &AccountView) -> Identity {
    Identity {
        account_id: account.id,
        username: account.username.clone(),
    }
}
