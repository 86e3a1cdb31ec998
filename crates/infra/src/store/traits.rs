use async_trait::async_trait;
use thiserror::Error;

use bazaar_auth::{NewUser, Role, User};
use bazaar_core::{ProductId, SaleId, UserId};
use bazaar_products::{NewProduct, Product};
use bazaar_sales::{NewSale, Sale, SaleDetails, SaleFilter, SaleLineItem, SaleStatus};

/// Persistence failure.
///
/// Backend detail stays in the message for logs; callers only branch on the
/// variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("referenced record does not exist: {0}")]
    MissingReference(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `UniqueViolation` when the email is already taken.
    async fn insert(&self, user: NewUser) -> StoreResult<User>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>>;

    /// All users ordered by id, optionally restricted to one role.
    async fn list(&self, role: Option<Role>) -> StoreResult<Vec<User>>;

    /// Remove a user and every sale they are a party to.
    /// Returns `false` when no such user existed.
    async fn delete(&self, id: UserId) -> StoreResult<bool>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: NewProduct) -> StoreResult<Product>;

    async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>>;

    async fn list(&self) -> StoreResult<Vec<Product>>;
}

#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Insert the sale and all of its line items as one atomic unit.
    ///
    /// The store assigns the id and the sale date; the status is always the
    /// initial one.
    async fn insert(&self, sale: NewSale) -> StoreResult<SaleDetails>;

    async fn find_by_id(&self, id: SaleId) -> StoreResult<Option<Sale>>;

    async fn line_items(&self, id: SaleId) -> StoreResult<Vec<SaleLineItem>>;

    /// Sales matching `filter`, ordered by id.
    async fn list(&self, filter: SaleFilter) -> StoreResult<Vec<Sale>>;

    /// Compare-and-swap the status of a sale.
    ///
    /// Writes `next` only if the stored status still equals `expected`.
    /// Returns `false` when the sale is gone or its status moved in between.
    async fn update_status(
        &self,
        id: SaleId,
        expected: SaleStatus,
        next: SaleStatus,
    ) -> StoreResult<bool>;
}
