use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bazaar_core::UserId;

use crate::Role;

/// Verified caller identity carried inside a token.
///
/// This is a snapshot taken at issuance: it does not follow later role
/// changes or deletions of the underlying user until a new token is issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// JWT claims model (transport-agnostic).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Embedded identity snapshot.
    pub identity: Identity,

    /// Issued-at (seconds since epoch).
    pub iat: i64,

    /// Expiration (seconds since epoch).
    pub exp: i64,
}

impl TokenClaims {
    /// Returns `None` when `issued_at + ttl` is not a representable instant.
    pub fn new(identity: Identity, issued_at: DateTime<Utc>, ttl: Duration) -> Option<Self> {
        let expires_at = issued_at.checked_add_signed(ttl)?;
        Some(Self {
            identity,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Clock skew tolerated between the issuer and the verifier.
pub const CLOCK_LEEWAY_SECS: i64 = 60;

/// Deterministically validate the time window of decoded claims.
///
/// Signature verification happens before this; this only guards against
/// claims that verify but make no sense.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now + CLOCK_LEEWAY_SECS < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp + CLOCK_LEEWAY_SECS {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
