//! Registration, login and the refresh-token lifecycle
//!
//! Access tokens are stateless: signature, expiry and type are enough. Refresh
//! tokens are additionally bound to the single digest stored on the account,
//! so logout revokes them and each successful refresh rotates the slot with a
//! compare-and-swap. Replaying a rotated token fails the comparison.

use crate::blob::{delete_orphan, BlobStore};
use crate::error::{AppError, Result};
use crate::models::{Account, AccountView, Identity, NewAccount};
use crate::repository::Repositories;
use crate::security::{hash_password, validate_password_policy, verify_password};
use crate::services::{required_text, required_upload};
use crypto_core::{sha256_hex, JwtSigner, TokenPair, TokenType};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use video_core::constants::ALLOWED_IMAGE_EXTENSIONS;

#[derive(Debug, Clone, Default)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    /// Local file to upload as the avatar
    pub avatar: Option<PathBuf>,
    pub cover: Option<PathBuf>,
}

/// Either identifier may be given; an account matching either one is used
#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub account: AccountView,
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct SessionManager {
    repos: Repositories,
    blobs: Arc<dyn BlobStore>,
    signer: Arc<JwtSigner>,
}

impl SessionManager {
    pub fn new(repos: Repositories, blobs: Arc<dyn BlobStore>, signer: Arc<JwtSigner>) -> Self {
        Self {
            repos,
            blobs,
            signer,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AccountView> {
        let full_name = required_text(&request.full_name, "full_name")?;
        let username = required_text(&request.username, "username")?.to_lowercase();
        let email = required_text(&request.email, "email")?.to_lowercase();
        if request.password.trim().is_empty() {
            return Err(AppError::validation("password is required"));
        }
        if username.chars().any(char::is_whitespace) {
            return Err(AppError::validation("username must not contain whitespace"));
        }
        if !email.contains('@') {
            return Err(AppError::validation("email is invalid"));
        }
        validate_password_policy(&request.password)?;

        let avatar_path = required_upload(
            request.avatar.as_deref(),
            "avatar",
            ALLOWED_IMAGE_EXTENSIONS,
        )?;
        let cover_path = request
            .cover
            .as_deref()
            .map(|path| required_upload(Some(path), "cover", ALLOWED_IMAGE_EXTENSIONS))
            .transpose()?;

        // Checked before uploading; the unique constraints still decide races
        if self
            .repos
            .run("accounts.find_by_username", self.repos.accounts.find_by_username(&username))
            .await?
            .is_some()
        {
            return Err(AppError::UsernameAlreadyExists);
        }
        if self
            .repos
            .run("accounts.find_by_email", self.repos.accounts.find_by_email(&email))
            .await?
            .is_some()
        {
            return Err(AppError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&request.password)?;

        let avatar = self.blobs.upload(avatar_path).await?;
        let cover = match cover_path {
            Some(path) => match self.blobs.upload(path).await {
                Ok(blob) => Some(blob),
                Err(e) => {
                    delete_orphan(self.blobs.as_ref(), &avatar.url, "registration failed").await;
                    return Err(e);
                }
            },
            None => None,
        };

        let new_account = NewAccount {
            username,
            email,
            full_name,
            password_hash,
            avatar_url: avatar.url.clone(),
            cover_url: cover.as_ref().map(|blob| blob.url.clone()),
        };

        let account = match self
            .repos
            .run("accounts.insert", self.repos.accounts.insert(new_account))
            .await
        {
            Ok(account) => account,
            Err(e) => {
                delete_orphan(self.blobs.as_ref(), &avatar.url, "registration failed").await;
                if let Some(cover) = &cover {
                    delete_orphan(self.blobs.as_ref(), &cover.url, "registration failed").await;
                }
                return Err(e);
            }
        };

        info!(account_id = %account.id, username = %account.username, "Account registered");
        Ok(account.view())
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome> {
        let username = non_blank(request.username.as_deref());
        let email = non_blank(request.email.as_deref());
        if username.is_none() && email.is_none() {
            return Err(AppError::validation("username or email is required"));
        }
        if request.password.is_empty() {
            return Err(AppError::validation("password is required"));
        }

        let account = self
            .repos
            .run(
                "accounts.find_by_login",
                self.repos.accounts.find_by_login(username, email),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Account"))?;

        if !verify_password(&request.password, &account.password_hash)? {
            warn!(account_id = %account.id, "Login rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let tokens = self.issue_tokens(&account)?;
        self.repos
            .run(
                "accounts.set_refresh_token_hash",
                self.repos
                    .accounts
                    .set_refresh_token_hash(account.id, Some(sha256_hex(&tokens.refresh_token))),
            )
            .await?;

        info!(account_id = %account.id, "Account logged in");
        Ok(LoginOutcome {
            account: account.view(),
            tokens,
        })
    }

    /// Exchange a refresh token for a new pair, invalidating the presented one
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let refresh_token = refresh_token.trim();
        if refresh_token.is_empty() {
            return Err(AppError::Unauthorized("refresh token is required".to_string()));
        }

        let claims = self.signer.verify(refresh_token, TokenType::Refresh)?;
        let account_id = claims.subject_id()?;

        let account = self
            .repos
            .run("accounts.find_by_id", self.repos.accounts.find_by_id(account_id))
            .await?
            .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;

        let presented_hash = sha256_hex(refresh_token);
        if account.refresh_token_hash.as_deref() != Some(presented_hash.as_str()) {
            warn!(%account_id, "Refresh rejected: token is stale or revoked");
            return Err(AppError::Unauthorized(
                "refresh token is expired or already used".to_string(),
            ));
        }

        let tokens = self.issue_tokens(&account)?;
        let rotated = self
            .repos
            .run(
                "accounts.swap_refresh_token_hash",
                self.repos.accounts.swap_refresh_token_hash(
                    account_id,
                    &presented_hash,
                    &sha256_hex(&tokens.refresh_token),
                ),
            )
            .await?;

        if !rotated {
            warn!(%account_id, "Refresh rejected: lost rotation race");
            return Err(AppError::Unauthorized(
                "refresh token is expired or already used".to_string(),
            ));
        }

        info!(%account_id, "Refresh token rotated");
        Ok(tokens)
    }

    /// Clear the refresh-token slot. Safe to repeat.
    pub async fn logout(&self, identity: &Identity) -> Result<()> {
        self.repos
            .run(
                "accounts.set_refresh_token_hash",
                self.repos
                    .accounts
                    .set_refresh_token_hash(identity.account_id, None),
            )
            .await?;

        info!(account_id = %identity.account_id, "Account logged out");
        Ok(())
    }

    /// Sessions and the refresh token survive a password change
    pub async fn change_password(
        &self,
        identity: &Identity,
        old_password: &str,
        new_password: &str,
    ) -> Result<()> {
        if old_password.is_empty() || new_password.is_empty() {
            return Err(AppError::validation("old and new password are required"));
        }
        validate_password_policy(new_password)?;

        let account = self.load_account(identity).await?;
        if !verify_password(old_password, &account.password_hash)? {
            warn!(account_id = %account.id, "Password change rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let password_hash = hash_password(new_password)?;
        let updated = self
            .repos
            .run(
                "accounts.update_password_hash",
                self.repos
                    .accounts
                    .update_password_hash(account.id, &password_hash),
            )
            .await?;
        if !updated {
            return Err(AppError::not_found("Account"));
        }

        info!(account_id = %account.id, "Password changed");
        Ok(())
    }

    /// Resolve an access token without touching the store
    pub fn authenticate(&self, access_token: &str) -> Result<Identity> {
        let token = access_token
            .trim()
            .strip_prefix("Bearer ")
            .unwrap_or(access_token.trim());
        if token.is_empty() {
            return Err(AppError::Unauthorized("access token is required".to_string()));
        }

        let claims = self.signer.verify(token, TokenType::Access)?;
        Ok(Identity {
            account_id: claims.subject_id()?,
            username: claims.username,
        })
    }

    pub async fn current_account(&self, identity: &Identity) -> Result<AccountView> {
        Ok(self.load_account(identity).await?.view())
    }

    async fn load_account(&self, identity: &Identity) -> Result<Account> {
        self.repos
            .run(
                "accounts.find_by_id",
                self.repos.accounts.find_by_id(identity.account_id),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Account"))
    }

    fn issue_tokens(&self, account: &Account) -> Result<TokenPair> {
        Ok(self
            .signer
            .issue_pair(account.id, &account.username, &account.email)?)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
