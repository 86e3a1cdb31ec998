use core::str::FromStr;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_auth::SaleParties;
use bazaar_core::{DomainError, DomainResult, ProductId, SaleId, UserId};

/// Largest total a sale may carry: 9,999,999.99, the range of the stored
/// `NUMERIC(9, 2)` column.
pub const MAX_TOTAL_PRICE: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 2);

/// Sale status lifecycle, in strict forward order.
///
/// Wire and storage names are the marketplace's own status labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SaleStatus {
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Preparando")]
    Preparing,
    #[serde(rename = "Em Trânsito")]
    InTransit,
    #[serde(rename = "Entregue")]
    Delivered,
}

impl SaleStatus {
    pub const ALL: [SaleStatus; 4] = [
        SaleStatus::Pending,
        SaleStatus::Preparing,
        SaleStatus::InTransit,
        SaleStatus::Delivered,
    ];

    /// The sole initial status.
    pub const INITIAL: SaleStatus = SaleStatus::Pending;

    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "Pendente",
            SaleStatus::Preparing => "Preparando",
            SaleStatus::InTransit => "Em Trânsito",
            SaleStatus::Delivered => "Entregue",
        }
    }

    /// The single status that may follow this one, if any.
    pub fn successor(&self) -> Option<SaleStatus> {
        match self {
            SaleStatus::Pending => Some(SaleStatus::Preparing),
            SaleStatus::Preparing => Some(SaleStatus::InTransit),
            SaleStatus::InTransit => Some(SaleStatus::Delivered),
            SaleStatus::Delivered => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.successor().is_none()
    }
}

impl core::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SaleStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::validation("status", format!("unknown sale status '{s}'")))
    }
}

/// A stored sale.
///
/// `user_id` (buyer) and `seller_id` are fixed at creation; `status` is the
/// only field that moves afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: SaleId,
    pub user_id: UserId,
    pub seller_id: UserId,
    pub total_price: Decimal,
    pub delivery_address: String,
    pub delivery_number: String,
    pub status: SaleStatus,
    #[serde(rename = "saleDate")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    pub fn parties(&self) -> SaleParties {
        SaleParties {
            buyer: self.user_id,
            seller: self.seller_id,
        }
    }
}

/// A product line of a stored sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineItem {
    pub sale_id: SaleId,
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A product line requested for a new sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A sale that has not been stored yet.
///
/// Stores insert the sale and all of its line items as one atomic unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub user_id: UserId,
    pub seller_id: UserId,
    pub total_price: Decimal,
    pub delivery_address: String,
    pub delivery_number: String,
    pub items: Vec<LineItem>,
}

impl NewSale {
    /// Creation-time invariants that do not need any lookup.
    pub fn validate(&self) -> DomainResult<()> {
        if self.total_price.is_sign_negative() {
            return Err(DomainError::validation("totalPrice", "must be greater than or equal to 0"));
        }
        if self.total_price.round_dp(2) > MAX_TOTAL_PRICE {
            return Err(DomainError::validation(
                "totalPrice",
                format!("must be less than or equal to {MAX_TOTAL_PRICE}"),
            ));
        }
        if self.delivery_address.trim().is_empty() {
            return Err(DomainError::validation("deliveryAddress", "is not allowed to be empty"));
        }
        if self.delivery_number.trim().is_empty() {
            return Err(DomainError::validation("deliveryNumber", "is not allowed to be empty"));
        }
        if self.items.is_empty() {
            return Err(DomainError::validation("products", "must contain at least 1 item"));
        }

        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if item.quantity < 1 {
                return Err(DomainError::validation("quantity", "must be greater than or equal to 1"));
            }
            if !seen.insert(item.product_id) {
                return Err(DomainError::validation(
                    "products",
                    format!("contains a duplicate product {}", item.product_id),
                ));
            }
        }
        Ok(())
    }

    /// Materialize the stored rows once the store has assigned an id.
    ///
    /// The status is always the initial one regardless of caller input.
    pub fn into_rows(self, id: SaleId, created_at: DateTime<Utc>) -> (Sale, Vec<SaleLineItem>) {
        let items = self
            .items
            .iter()
            .map(|item| SaleLineItem {
                sale_id: id,
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect();

        let sale = Sale {
            id,
            user_id: self.user_id,
            seller_id: self.seller_id,
            total_price: self.total_price.round_dp(2),
            delivery_address: self.delivery_address,
            delivery_number: self.delivery_number,
            status: SaleStatus::INITIAL,
            created_at,
        };
        (sale, items)
    }
}

/// A sale together with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDetails {
    #[serde(flatten)]
    pub sale: Sale,
    pub products: Vec<SaleLineItem>,
}

/// Predicate for listing sales.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SaleFilter {
    All,
    Buyer(UserId),
    Seller(UserId),
}

impl SaleFilter {
    pub fn matches(&self, sale: &Sale) -> bool {
        match self {
            SaleFilter::All => true,
            SaleFilter::Buyer(id) => sale.user_id == *id,
            SaleFilter::Seller(id) => sale.seller_id == *id,
        }
    }
}
