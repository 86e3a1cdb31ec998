use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, routing::get, Json, Router};

use crate::app::{errors, services::AppServices};
use crate::middleware::BearerToken;

pub fn router() -> Router {
    Router::new().route("/", get(list_products))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
) -> axum::response::Response {
    match services.products.list_products(token.as_str()).await {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
