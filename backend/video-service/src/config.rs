/// Service configuration loaded from environment variables
use anyhow::{bail, Context, Result};
use chrono::Duration as ChronoDuration;
use crypto_core::jwt::{
    DEFAULT_ACCESS_TOKEN_TTL_SECS, DEFAULT_ISSUER, DEFAULT_REFRESH_TOKEN_TTL_DAYS,
};
use crypto_core::JwtSigner;
use db_pool::DbConfig;
use s3_utils::S3Config;
use std::fmt;
use std::time::Duration;

pub const SERVICE_NAME: &str = "video-service";
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DbConfig,
    pub jwt: JwtSettings,
    pub s3: S3Config,
    /// Upper bound applied to every repository call
    pub store_timeout: Duration,
}

#[derive(Clone)]
pub enum JwtKeys {
    /// RS256 key pair, PEM encoded
    Rsa {
        private_key_pem: String,
        public_key_pem: String,
    },
    /// HS256 shared secret for local development
    Secret(String),
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JwtKeys::Rsa { .. } => f.write_str("Rsa([REDACTED])"),
            JwtKeys::Secret(_) => f.write_str("Secret([REDACTED])"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub keys: JwtKeys,
    pub issuer: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_days: i64,
}

impl JwtSettings {
    pub fn from_env() -> Result<Self> {
        let private_key = std::env::var("JWT_PRIVATE_KEY").ok();
        let public_key = std::env::var("JWT_PUBLIC_KEY").ok();

        let keys = match (private_key, public_key) {
            (Some(private_key_pem), Some(public_key_pem)) => JwtKeys::Rsa {
                private_key_pem,
                public_key_pem,
            },
            (Some(_), None) | (None, Some(_)) => {
                bail!("JWT_PRIVATE_KEY and JWT_PUBLIC_KEY must be set together")
            }
            (None, None) => JwtKeys::Secret(
                std::env::var("JWT_SECRET")
                    .context("JWT_PRIVATE_KEY/JWT_PUBLIC_KEY or JWT_SECRET must be set")?,
            ),
        };

        Ok(Self {
            keys,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string()),
            access_ttl_secs: parse_env("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TOKEN_TTL_SECS)?,
            refresh_ttl_days: parse_env("REFRESH_TOKEN_TTL_DAYS", DEFAULT_REFRESH_TOKEN_TTL_DAYS)?,
        })
    }

    pub fn signer(&self) -> Result<JwtSigner> {
        if self.access_ttl_secs <= 0 || self.refresh_ttl_days <= 0 {
            bail!("token lifetimes must be positive");
        }

        let signer = match &self.keys {
            JwtKeys::Rsa {
                private_key_pem,
                public_key_pem,
            } => JwtSigner::from_rsa_pem(private_key_pem, public_key_pem)
                .context("Failed to load RS256 key pair")?,
            JwtKeys::Secret(secret) => {
                tracing::warn!("Using HS256 shared-secret tokens; configure an RS256 key pair in production");
                JwtSigner::from_secret(secret.as_bytes()).context("Invalid JWT_SECRET")?
            }
        };

        Ok(signer.with_issuer(self.issuer.clone()).with_ttls(
            ChronoDuration::seconds(self.access_ttl_secs),
            ChronoDuration::days(self.refresh_ttl_days),
        ))
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let database = DbConfig::from_env(SERVICE_NAME)
            .map_err(anyhow::Error::msg)
            .context("Failed to load database configuration")?;

        Ok(Self {
            database,
            jwt: JwtSettings::from_env()?,
            s3: S3Config::from_env(),
            store_timeout: Duration::from_millis(parse_env(
                "STORE_TIMEOUT_MS",
                DEFAULT_STORE_TIMEOUT_MS,
            )?),
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw}")),
        Err(_) => Ok(default),
    }
}
