//! Application services: one per use-case area, composed over the stores.
//!
//! Every protected operation takes the caller's raw token and verifies it
//! through [`Authenticator`] before touching any store.

use std::sync::Arc;

use thiserror::Error;

use bazaar_auth::{
    Argon2Digest, Hs256TokenService, Identity, PasswordDigest, TokenService,
    INVALID_TOKEN_MESSAGE,
};
use bazaar_core::DomainError;
use bazaar_infra::{InMemoryStore, ProductStore, SaleStore, StoreError, UserStore};

use crate::config::AppConfig;

pub mod orders;
pub mod products;
pub mod users;

pub use orders::{OrderService, PlaceOrder, StatusChange};
pub use products::ProductService;
pub use users::{AuthenticatedUser, NewAccount, UserService};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Turns a presented token into the caller's identity.
pub struct Authenticator {
    tokens: Arc<dyn TokenService>,
    users: Arc<dyn UserStore>,
    live_role_check: bool,
}

impl Authenticator {
    pub fn new(
        tokens: Arc<dyn TokenService>,
        users: Arc<dyn UserStore>,
        live_role_check: bool,
    ) -> Self {
        Self {
            tokens,
            users,
            live_role_check,
        }
    }

    /// Verify `token` and return the caller.
    ///
    /// By default the identity embedded at issuance is trusted for the
    /// token's lifetime. With live role checks enabled the caller is re-read
    /// from the store: the current role wins and deleted users are rejected.
    pub async fn authenticate(&self, token: &str) -> ServiceResult<Identity> {
        let identity = self.tokens.verify(token).map_err(DomainError::from)?;
        if !self.live_role_check {
            return Ok(identity);
        }

        match self.users.find_by_id(identity.id).await? {
            Some(user) => Ok(user.identity()),
            None => {
                tracing::warn!(user_id = %identity.id, "token presented for a deleted user");
                Err(DomainError::unauthorized(INVALID_TOKEN_MESSAGE).into())
            }
        }
    }

    pub fn issue(&self, identity: &Identity) -> ServiceResult<String> {
        self.tokens.issue(identity).map_err(|e| {
            tracing::error!(error = %e, "failed to issue token");
            ServiceError::from(DomainError::from(e))
        })
    }
}

/// The store handles every service needs, usually all backed by one store.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub sales: Arc<dyn SaleStore>,
}

impl Stores {
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: UserStore + ProductStore + SaleStore + 'static,
    {
        Self {
            users: backend.clone(),
            products: backend.clone(),
            sales: backend,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_backend(InMemoryStore::arc())
    }
}

/// Everything the HTTP layer calls into.
pub struct AppServices {
    pub users: UserService,
    pub products: ProductService,
    pub orders: OrderService,
}

impl AppServices {
    pub fn new(
        stores: Stores,
        tokens: Arc<dyn TokenService>,
        digest: Arc<dyn PasswordDigest>,
        live_role_check: bool,
    ) -> Self {
        let auth = Arc::new(Authenticator::new(
            tokens,
            stores.users.clone(),
            live_role_check,
        ));

        Self {
            users: UserService::new(auth.clone(), stores.users.clone(), digest),
            products: ProductService::new(auth.clone(), stores.products.clone()),
            orders: OrderService::new(auth, stores.users, stores.products, stores.sales),
        }
    }

    /// Wire the services from configuration over already-opened stores.
    pub fn from_config(config: &AppConfig, stores: Stores) -> Self {
        let tokens = Arc::new(Hs256TokenService::new(
            config.jwt_secret.as_bytes(),
            config.token_ttl,
        ));
        Self::new(
            stores,
            tokens,
            Arc::new(Argon2Digest::new()),
            config.live_role_check,
        )
    }
}
