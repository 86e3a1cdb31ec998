use std::sync::Arc;

use serde::Serialize;

use bazaar_auth::{require_role, NewUser, PasswordDigest, Role, User, UserProfile};
use bazaar_core::{DomainError, UserId};
use bazaar_infra::{StoreError, UserStore};

use super::{Authenticator, ServiceError, ServiceResult};
use crate::config::BootstrapAdmin;

const ALREADY_REGISTERED: &str = "User already registered";
const BAD_CREDENTIALS: &str = "Incorrect email or password";
const USER_NOT_FOUND: &str = "User not found";

/// Account data after field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// A user together with a freshly issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
}

pub struct UserService {
    auth: Arc<Authenticator>,
    users: Arc<dyn UserStore>,
    digest: Arc<dyn PasswordDigest>,
}

impl UserService {
    pub fn new(
        auth: Arc<Authenticator>,
        users: Arc<dyn UserStore>,
        digest: Arc<dyn PasswordDigest>,
    ) -> Self {
        Self {
            auth,
            users,
            digest,
        }
    }

    /// Self-registration. The role is always `customer`, whatever was asked.
    pub async fn register(&self, account: NewAccount) -> ServiceResult<AuthenticatedUser> {
        let user = self
            .create(NewAccount {
                role: Role::Customer,
                ..account
            })
            .await?;
        let token = self.auth.issue(&user.identity())?;
        Ok(AuthenticatedUser { user, token })
    }

    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<AuthenticatedUser> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) if self.digest.verify(password, &user.password_digest) => user,
            _ => {
                tracing::info!("login rejected");
                return Err(DomainError::not_found(BAD_CREDENTIALS).into());
            }
        };

        let token = self.auth.issue(&user.identity())?;
        Ok(AuthenticatedUser { user, token })
    }

    /// Administrator-only creation with an explicit role.
    pub async fn create_user_as_admin(
        &self,
        token: &str,
        account: NewAccount,
    ) -> ServiceResult<User> {
        let caller = self.auth.authenticate(token).await?;
        require_role(&caller, Role::Administrator)?;

        let user = self.create(account).await?;
        tracing::info!(admin_id = %caller.id, user_id = %user.id, role = %user.role, "user created by administrator");
        Ok(user)
    }

    pub async fn list_users(&self, token: &str) -> ServiceResult<Vec<User>> {
        let caller = self.auth.authenticate(token).await?;
        require_role(&caller, Role::Administrator)?;
        Ok(self.users.list(None).await?)
    }

    pub async fn list_sellers(&self, token: &str) -> ServiceResult<Vec<UserProfile>> {
        self.auth.authenticate(token).await?;
        let sellers = self.users.list(Some(Role::Seller)).await?;
        Ok(sellers.iter().map(User::profile).collect())
    }

    pub async fn get_user(&self, token: &str, id: UserId) -> ServiceResult<UserProfile> {
        self.auth.authenticate(token).await?;
        self.users
            .find_by_id(id)
            .await?
            .map(|user| user.profile())
            .ok_or_else(|| DomainError::not_found(USER_NOT_FOUND).into())
    }

    pub async fn delete_user(&self, token: &str, id: UserId) -> ServiceResult<()> {
        let caller = self.auth.authenticate(token).await?;
        require_role(&caller, Role::Administrator)?;

        if !self.users.delete(id).await? {
            return Err(DomainError::not_found(USER_NOT_FOUND).into());
        }
        tracing::info!(admin_id = %caller.id, user_id = %id, "user deleted");
        Ok(())
    }

    /// Create the configured administrator unless its email is already taken.
    ///
    /// Returns `true` when an account was created.
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> ServiceResult<bool> {
        if self.users.find_by_email(&admin.email).await?.is_some() {
            return Ok(false);
        }

        let user = self
            .create(NewAccount {
                name: admin.name.clone(),
                email: admin.email.clone(),
                password: admin.password.clone(),
                role: Role::Administrator,
            })
            .await?;
        tracing::info!(user_id = %user.id, "bootstrap administrator created");
        Ok(true)
    }

    async fn create(&self, account: NewAccount) -> ServiceResult<User> {
        if self.users.find_by_email(&account.email).await?.is_some() {
            return Err(DomainError::conflict(ALREADY_REGISTERED).into());
        }

        let password_digest = self.digest.digest(&account.password).map_err(|e| {
            tracing::error!(error = %e, "password digest failed");
            ServiceError::Store(StoreError::Backend(e.to_string()))
        })?;

        // The lookup above can race with a concurrent registration; the
        // store's unique constraint settles it.
        self.users
            .insert(NewUser {
                name: account.name,
                email: account.email,
                password_digest,
                role: account.role,
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => DomainError::conflict(ALREADY_REGISTERED).into(),
                other => ServiceError::Store(other),
            })
    }
}
