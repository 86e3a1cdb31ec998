use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use bazaar_auth::Role;
use bazaar_core::{DomainError, DomainResult, ProductId, UserId};
use bazaar_sales::LineItem;

use crate::app::errors;
use crate::app::services::{NewAccount, PlaceOrder};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 12, message = "length must be at least 12 characters long"))]
    pub name: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "length must be at least 6 characters long"))]
    pub password: String,
}

impl RegisterRequest {
    pub fn into_account(self) -> NewAccount {
        NewAccount {
            name: self.name,
            email: self.email,
            password: self.password,
            role: Role::Customer,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "length must be at least 6 characters long"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreateUserRequest {
    #[validate(length(min = 12, message = "length must be at least 12 characters long"))]
    pub name: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "length must be at least 6 characters long"))]
    pub password: String,
    #[validate(length(min = 1, message = "is not allowed to be empty"))]
    pub role: String,
}

impl AdminCreateUserRequest {
    pub fn into_account(self) -> DomainResult<NewAccount> {
        Ok(NewAccount {
            role: self.role.parse()?,
            name: self.name,
            email: self.email,
            password: self.password,
        })
    }
}

// `Serialize` is needed by the length rule on the enclosing list.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaleProductRequest {
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub product_id: i64,
    #[validate(range(min = 1, message = "must be greater than or equal to 1"))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub seller_id: i64,
    pub total_price: Decimal,
    #[validate(length(min = 1, message = "is not allowed to be empty"))]
    pub delivery_address: String,
    #[validate(length(min = 1, message = "is not allowed to be empty"))]
    pub delivery_number: String,
    #[validate(length(min = 1, message = "must contain at least 1 item"), nested)]
    pub products: Vec<SaleProductRequest>,
}

impl CreateSaleRequest {
    pub fn into_order(self) -> PlaceOrder {
        PlaceOrder {
            seller_id: UserId::new(self.seller_id),
            total_price: self.total_price,
            delivery_address: self.delivery_address,
            delivery_number: self.delivery_number,
            items: self
                .products
                .into_iter()
                .map(|p| LineItem {
                    product_id: ProductId::new(p.product_id),
                    quantity: p.quantity,
                })
                .collect(),
        }
    }
}

// -------------------------
// Extraction + validation
// -------------------------

/// JSON body that has been deserialized and passed its field rules.
///
/// Both malformed bodies and rule violations are answered with a
/// `validation_error` before the handler runs.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = axum::response::Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                errors::json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text())
            })?;

        validate(&value).map_err(errors::domain_error_to_response)?;
        Ok(Self(value))
    }
}

/// Run the field rules of `value`, reporting the first violated field.
pub fn validate<T: Validate>(value: &T) -> DomainResult<()> {
    value.validate().map_err(|errs| match first_violation(&errs) {
        Some((field, reason)) => DomainError::validation(field, reason),
        None => DomainError::validation("body", "is invalid"),
    })
}

fn first_violation(errors: &ValidationErrors) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let found = match kind {
            ValidationErrorsKind::Field(errs) => errs
                .first()
                .map(|err| (camel_case(field), describe(err))),
            ValidationErrorsKind::Struct(inner) => first_violation(inner),
            ValidationErrorsKind::List(items) => items.values().find_map(|inner| first_violation(inner)),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

fn describe(err: &ValidationError) -> String {
    err.message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| err.code.to_string())
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
