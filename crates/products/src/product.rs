use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::ProductId;

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price with two decimal places.
    pub price: Decimal,
    pub url_image: String,
}

/// A product that has not been stored yet (id is assigned by the store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub url_image: String,
}

impl NewProduct {
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price.round_dp(2),
            url_image: self.url_image,
        }
    }
}
