use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use bazaar_auth::{require_party, Role};
use bazaar_core::{DomainError, SaleId, UserId};
use bazaar_infra::{ProductStore, SaleStore, StoreError, UserStore};
use bazaar_sales::{next_status, LineItem, NewSale, Sale, SaleDetails, SaleFilter, SaleStatus};

use super::{Authenticator, ServiceError, ServiceResult};

const SALE_NOT_FOUND: &str = "Sale not found";
const SELLER_NOT_FOUND: &str = "Seller not found";
const PRODUCT_NOT_FOUND: &str = "Product not found";
const CONCURRENT_UPDATE: &str = "Sale status changed concurrently";

/// Order data after field validation. The buyer is always the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrder {
    pub seller_id: UserId,
    pub total_price: Decimal,
    pub delivery_address: String,
    pub delivery_number: String,
    pub items: Vec<LineItem>,
}

/// Result of a successful status update.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub id: SaleId,
    pub status: SaleStatus,
}

pub struct OrderService {
    auth: Arc<Authenticator>,
    users: Arc<dyn UserStore>,
    products: Arc<dyn ProductStore>,
    sales: Arc<dyn SaleStore>,
}

impl OrderService {
    pub fn new(
        auth: Arc<Authenticator>,
        users: Arc<dyn UserStore>,
        products: Arc<dyn ProductStore>,
        sales: Arc<dyn SaleStore>,
    ) -> Self {
        Self {
            auth,
            users,
            products,
            sales,
        }
    }

    pub async fn create_order(&self, token: &str, order: PlaceOrder) -> ServiceResult<Sale> {
        let buyer = self.auth.authenticate(token).await?;

        let sale = NewSale {
            user_id: buyer.id,
            seller_id: order.seller_id,
            total_price: order.total_price,
            delivery_address: order.delivery_address,
            delivery_number: order.delivery_number,
            items: order.items,
        };
        sale.validate()?;

        match self.users.find_by_id(sale.seller_id).await? {
            Some(seller) if seller.role == Role::Seller => {}
            _ => return Err(DomainError::not_found(SELLER_NOT_FOUND).into()),
        }
        for item in &sale.items {
            if self.products.find_by_id(item.product_id).await?.is_none() {
                return Err(DomainError::not_found(PRODUCT_NOT_FOUND).into());
            }
        }

        // A product or party deleted since the checks above surfaces as a
        // missing reference; nothing is left behind either way.
        let created = self.sales.insert(sale).await.map_err(|e| match e {
            StoreError::MissingReference(detail) => {
                tracing::info!(%detail, "sale references vanished during insert");
                ServiceError::from(DomainError::not_found(PRODUCT_NOT_FOUND))
            }
            other => ServiceError::Store(other),
        })?;

        tracing::info!(
            sale_id = %created.sale.id,
            buyer_id = %created.sale.user_id,
            seller_id = %created.sale.seller_id,
            items = created.products.len(),
            "sale created"
        );
        Ok(created.sale)
    }

    /// Any verified identity may read any sale.
    pub async fn get_order(&self, token: &str, id: SaleId) -> ServiceResult<SaleDetails> {
        self.auth.authenticate(token).await?;
        let sale = self.load(id).await?;
        let products = self.sales.line_items(id).await?;
        Ok(SaleDetails { sale, products })
    }

    pub async fn list_orders(&self, token: &str) -> ServiceResult<Vec<Sale>> {
        self.auth.authenticate(token).await?;
        Ok(self.sales.list(SaleFilter::All).await?)
    }

    pub async fn list_orders_for_buyer(&self, token: &str) -> ServiceResult<Vec<Sale>> {
        let caller = self.auth.authenticate(token).await?;
        Ok(self.sales.list(SaleFilter::Buyer(caller.id)).await?)
    }

    pub async fn list_orders_for_seller(&self, token: &str) -> ServiceResult<Vec<Sale>> {
        let caller = self.auth.authenticate(token).await?;
        Ok(self.sales.list(SaleFilter::Seller(caller.id)).await?)
    }

    /// Advance a sale one step on behalf of the caller.
    ///
    /// The caller must be a party to the sale; the step is decided by the
    /// caller's verified role and the stored status. The write is a
    /// compare-and-swap on the status that was read.
    pub async fn request_status_update(&self, token: &str, id: SaleId) -> ServiceResult<StatusChange> {
        let caller = self.auth.authenticate(token).await?;
        let sale = self.load(id).await?;

        require_party(&caller, &sale.parties())?;
        let next = next_status(sale.status, caller.role).inspect_err(|_| {
            tracing::warn!(sale_id = %id, user_id = %caller.id, status = %sale.status, "status transition rejected");
        })?;

        if !self.sales.update_status(id, sale.status, next).await? {
            // Either the status moved or the sale was removed since `load`.
            self.load(id).await?;
            tracing::warn!(sale_id = %id, expected = %sale.status, "status update lost a race");
            return Err(DomainError::conflict(CONCURRENT_UPDATE).into());
        }

        tracing::info!(sale_id = %id, from = %sale.status, to = %next, actor_id = %caller.id, "sale status advanced");
        Ok(StatusChange { id, status: next })
    }

    async fn load(&self, id: SaleId) -> ServiceResult<Sale> {
        self.sales
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(SALE_NOT_FOUND).into())
    }
}
