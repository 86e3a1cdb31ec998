use std::sync::Arc;

use bazaar_infra::ProductStore;
use bazaar_products::{NewProduct, Product};

use super::{Authenticator, ServiceResult};

pub struct ProductService {
    auth: Arc<Authenticator>,
    products: Arc<dyn ProductStore>,
}

impl ProductService {
    pub fn new(auth: Arc<Authenticator>, products: Arc<dyn ProductStore>) -> Self {
        Self { auth, products }
    }

    /// Any verified identity may browse the catalog.
    pub async fn list_products(&self, token: &str) -> ServiceResult<Vec<Product>> {
        self.auth.authenticate(token).await?;
        Ok(self.products.list().await?)
    }

    /// Load `catalog` when the store has no products yet.
    ///
    /// Returns the number of products inserted.
    pub async fn seed_if_empty(&self, catalog: Vec<NewProduct>) -> ServiceResult<usize> {
        if !self.products.list().await?.is_empty() {
            return Ok(0);
        }

        let count = catalog.len();
        for product in catalog {
            self.products.insert(product).await?;
        }
        tracing::info!(count, "seeded product catalog");
        Ok(count)
    }
}
