//! Password digest capability.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("hashing failed: {0}")]
    Hashing(String),
}

/// Derives a storable digest from a password and checks candidates against it.
pub trait PasswordDigest: Send + Sync {
    fn digest(&self, plaintext: &str) -> Result<String, PasswordError>;

    /// `false` for a mismatch and for a digest that cannot be parsed.
    fn verify(&self, plaintext: &str, digest: &str) -> bool;
}

/// Argon2id with a random per-password salt, stored as a PHC string.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Digest;

impl Argon2Digest {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordDigest for Argon2Digest {
    fn digest(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return false;
        };
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
