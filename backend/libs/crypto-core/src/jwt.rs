/// Token signing and verification for Vidora services
///
/// Access tokens are stateless: a valid signature plus an unexpired `exp` is the
/// whole check. Refresh tokens carry the same claims with `token_type = refresh`;
/// whether a refresh token is still the *current* one for an account is decided
/// by the caller against its own store, not here.
///
/// ## Keys
///
/// - **RS256** from PEM (production). Private key signs, public key verifies.
/// - **HS256** from a shared secret (development and tests), minimum 32 bytes.
///
/// The algorithm is pinned per signer, so a token minted under one algorithm
/// never validates under another.
///
/// ## Usage
///
/// ```rust
/// use crypto_core::jwt::{JwtSigner, TokenType};
/// use uuid::Uuid;
///
/// let signer = JwtSigner::from_secret(b"0123456789abcdef0123456789abcdef").unwrap();
/// let pair = signer.issue_pair(Uuid::new_v4(), "alice", "alice@example.com").unwrap();
/// let claims = signer.verify(&pair.access_token, TokenType::Access).unwrap();
/// assert_eq!(claims.username, "alice");
/// ```
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3600;
pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 30;
pub const DEFAULT_ISSUER: &str = "vidora";

/// Shortest HS256 secret accepted
const MIN_SECRET_LEN: usize = 32;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("token expired")]
    Expired,

    #[error("token validation failed: {0}")]
    Invalid(String),

    #[error("expected {expected} token, got {actual}")]
    WrongTokenType {
        expected: TokenType,
        actual: TokenType,
    },

    #[error("invalid subject in token: {0}")]
    InvalidSubject(String),
}

impl JwtError {
    /// True when the presented token was rejected, false for key or signing faults.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            JwtError::Expired
                | JwtError::Invalid(_)
                | JwtError::WrongTokenType { .. }
                | JwtError::InvalidSubject(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, JwtError>;

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims: registered claims plus the account fields downstream calls need
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token id; two tokens minted in the same second still differ
    pub jti: String,
    pub iss: String,
    pub token_type: TokenType,
    pub username: String,
    pub email: String,
}

impl Claims {
    /// Parse the subject back into an account id
    pub fn subject_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| JwtError::InvalidSubject(e.to_string()))
    }
}

/// Token pair handed out on login and on every successful refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

// ============================================================================
// Signer
// ============================================================================

/// Holds the key material and lifetimes for one issuer.
///
/// Cheap to share behind an `Arc`; keys are immutable after construction.
pub struct JwtSigner {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSigner")
            .field("algorithm", &self.algorithm)
            .field("keys", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("access_ttl_secs", &self.access_ttl.num_seconds())
            .field("refresh_ttl_secs", &self.refresh_ttl.num_seconds())
            .finish()
    }
}

impl JwtSigner {
    /// Build an RS256 signer from PEM-encoded RSA keys
    pub fn from_rsa_pem(private_key_pem: &str, public_key_pem: &str) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("RSA private key: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("RSA public key: {e}")))?;

        Ok(Self::with_keys(Algorithm::RS256, encoding_key, decoding_key))
    }

    /// Build an HS256 signer from a shared secret
    pub fn from_secret(secret: &[u8]) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(JwtError::InvalidKey(format!(
                "HS256 secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        Ok(Self::with_keys(
            Algorithm::HS256,
            EncodingKey::from_secret(secret),
            DecodingKey::from_secret(secret),
        ))
    }

    fn with_keys(algorithm: Algorithm, encoding_key: EncodingKey, decoding_key: DecodingKey) -> Self {
        Self {
            algorithm,
            encoding_key,
            decoding_key,
            issuer: DEFAULT_ISSUER.to_string(),
            access_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_ttl: Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Sign a token of the given type with an explicit lifetime
    pub fn sign(
        &self,
        user_id: Uuid,
        username: &str,
        email: &str,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
            token_type,
            username: username.to_string(),
            email: email.to_string(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Signing(format!("{token_type} token: {e}")))
    }

    /// Mint a fresh access/refresh pair for an account
    pub fn issue_pair(&self, user_id: Uuid, username: &str, email: &str) -> Result<TokenPair> {
        let access_token = self.sign(user_id, username, email, TokenType::Access, self.access_ttl)?;
        let refresh_token =
            self.sign(user_id, username, email, TokenType::Refresh, self.refresh_ttl)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Verify signature, expiry, issuer and token type
    ///
    /// No leeway is granted on `exp`.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_issuer(&[self.issuer.as_str()]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            }
        })?;

        if data.claims.token_type != expected {
            return Err(JwtError::WrongTokenType {
                expected,
                actual: data.claims.token_type,
            });
        }

        Ok(data.claims)
    }
}

// ============================================================================
// Tests
// ============================================================================
