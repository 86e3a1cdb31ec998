//! Token Service: issue and verify signed identity tokens.
//!
//! Every protected operation goes through [`TokenService::verify`], so every
//! failure mode (malformed, unsigned, tampered, expired) collapses into the
//! same [`TokenError::Invalid`].

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use bazaar_core::DomainError;

use crate::claims::{validate_claims, Identity, TokenClaims, CLOCK_LEEWAY_SECS};

/// Message surfaced for every verification failure.
pub const INVALID_TOKEN_MESSAGE: &str = "Expired or invalid token";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Expired or invalid token")]
    Invalid,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for DomainError {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Invalid => DomainError::unauthorized(INVALID_TOKEN_MESSAGE),
            // Signing only fails on a broken key; callers still only learn
            // that no usable token exists.
            TokenError::Signing(_) => DomainError::unauthorized(INVALID_TOKEN_MESSAGE),
        }
    }
}

/// Issues and verifies opaque identity tokens.
pub trait TokenService: Send + Sync {
    /// Serialize `identity` into a signed token.
    fn issue(&self, identity: &Identity) -> Result<String, TokenError>;

    /// Verify `token` and return exactly the identity embedded at issuance.
    fn verify(&self, token: &str) -> Result<Identity, TokenError>;
}

/// HS256 token service keyed by a server-held secret.
///
/// The secret is handed over once at construction and never re-read.
#[derive(Clone)]
pub struct Hs256TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl Hs256TokenService {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let secret = secret.as_ref();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_LEEWAY_SECS as u64;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = TokenClaims::new(identity.clone(), now, self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let data = decode::<TokenClaims>(token.trim(), &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            TokenError::Invalid
        })?;

        validate_claims(&data.claims, now).map_err(|e| {
            tracing::debug!(error = %e, "token claims rejected");
            TokenError::Invalid
        })?;

        Ok(data.claims.identity)
    }
}

impl TokenService for Hs256TokenService {
    fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify_at(token, Utc::now())
    }
}

impl core::fmt::Debug for Hs256TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenService")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}
