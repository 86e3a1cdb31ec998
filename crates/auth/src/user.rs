//! User records as seen by the identity store.

use serde::{Deserialize, Serialize};

use bazaar_core::UserId;

use crate::{Identity, Role};

/// A persisted user.
///
/// The password digest never leaves the process: it is skipped on
/// serialization so a `User` can be logged or returned without leaking it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_digest: String,
    pub role: Role,
}

impl User {
    /// Snapshot the user into the identity embedded in tokens.
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// A user that has not been stored yet (id is assigned by the store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_digest: String,
    pub role: Role,
}

impl NewUser {
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            password_digest: self.password_digest,
            role: self.role,
        }
    }
}

/// Public view of a user: what any authenticated caller may see about
/// another user (no email, no role).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
}
