//! `bazaar-auth` — identity tokens, roles and access control.
//!
//! This crate is intentionally decoupled from HTTP and storage: it verifies
//! tokens, answers permission questions about already-loaded data, and
//! digests passwords. Loading users or sales is somebody else's job.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{require_party, require_role, SaleParties};
pub use claims::{validate_claims, Identity, TokenClaims, TokenValidationError};
pub use password::{Argon2Digest, PasswordDigest, PasswordError};
pub use roles::Role;
pub use token::{Hs256TokenService, TokenError, TokenService, INVALID_TOKEN_MESSAGE};
pub use user::{NewUser, User, UserProfile};
