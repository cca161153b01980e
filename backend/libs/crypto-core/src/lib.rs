//! Shared cryptographic primitives for Vidora services
//!
//! - `jwt`: access/refresh token signing and verification
//! - `hash`: digests used to persist secrets without storing them verbatim

pub mod hash;
pub mod jwt;

pub use hash::{sha256, sha256_hex};
pub use jwt::{Claims, JwtError, JwtSigner, TokenPair, TokenType};
