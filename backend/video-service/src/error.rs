use crypto_core::JwtError;
use s3_utils::S3Error;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Coarse failure classes callers map onto their transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload required: {0}")]
    UploadRequired(&'static str),

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Already subscribed to this channel")]
    DuplicateSubscription,

    #[error("Cannot subscribe to your own channel")]
    SelfSubscription,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Only the owner can modify this video")]
    NotVideoOwner,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store call timed out: {operation}")]
    StoreTimeout { operation: &'static str },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Blob store error: {0}")]
    Blob(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_)
            | AppError::UploadRequired(_)
            | AppError::WeakPassword(_)
            | AppError::SelfSubscription => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::InvalidCredentials
            | AppError::Unauthorized(_)
            | AppError::NotVideoOwner => ErrorKind::Unauthorized,
            AppError::UsernameAlreadyExists
            | AppError::EmailAlreadyExists
            | AppError::DuplicateSubscription
            | AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::StoreTimeout { .. }
            | AppError::Database(_)
            | AppError::Blob(_)
            | AppError::Token(_)
            | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// Message safe to hand to an external caller
    pub fn public_message(&self) -> String {
        match self.kind() {
            // Don't leak internal details
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

// Conversions from external error types
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match (db_err.code().as_deref(), db_err.constraint()) {
                (Some("23505"), Some("accounts_username_key")) => {
                    return AppError::UsernameAlreadyExists
                }
                (Some("23505"), Some("accounts_email_key")) => return AppError::EmailAlreadyExists,
                (Some("23505"), Some("subscriptions_pair_key")) => {
                    return AppError::DuplicateSubscription
                }
                (Some("23514"), Some("subscriptions_no_self")) => return AppError::SelfSubscription,
                (Some("23503"), _) => return AppError::NotFound("Referenced account".to_string()),
                (Some("23505"), _) => return AppError::Conflict(db_err.message().to_string()),
                _ => {}
            }
        }

        tracing::error!(error = %err, "Database error");
        AppError::Database(err.to_string())
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        if err.is_rejection() {
            AppError::Unauthorized(err.to_string())
        } else {
            tracing::error!(error = %err, "JWT error");
            AppError::Token(err.to_string())
        }
    }
}

impl From<S3Error> for AppError {
    fn from(err: S3Error) -> Self {
        tracing::error!(error = %err, "Blob store error");
        AppError::Blob(err.to_string())
    }
}
