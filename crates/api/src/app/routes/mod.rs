use core::str::FromStr;

use axum::{
    routing::{get, post},
    Router,
};

use bazaar_core::DomainError;

use crate::app::errors;

pub mod admin;
pub mod products;
pub mod sales;
pub mod system;
pub mod users;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/users/create", post(users::register))
        .route("/users/login", post(users::login))
}

/// Endpoints that require a bearer token.
pub fn protected_router() -> Router {
    Router::new()
        .nest("/users", users::router())
        .nest("/admin", admin::router())
        .nest("/products", products::router())
        .nest("/sales", sales::router())
}

/// Parse a path id, answering `400 invalid_id` on failure.
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}
