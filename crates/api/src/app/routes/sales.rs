use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use bazaar_core::SaleId;

use crate::app::dto::{CreateSaleRequest, ValidatedJson};
use crate::app::{errors, routes::parse_id, services::AppServices};
use crate::middleware::BearerToken;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_sales))
        .route("/create", post(create_sale))
        .route("/user", get(list_buyer_sales))
        .route("/seller", get(list_seller_sales))
        .route("/update/:id", patch(update_sale_status))
        .route("/:id", get(get_sale))
}

pub async fn create_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    ValidatedJson(body): ValidatedJson<CreateSaleRequest>,
) -> axum::response::Response {
    match services.orders.create_order(token.as_str(), body.into_order()).await {
        Ok(sale) => (StatusCode::CREATED, Json(sale)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_sales(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
) -> axum::response::Response {
    match services.orders.list_orders(token.as_str()).await {
        Ok(sales) => (StatusCode::OK, Json(sales)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_buyer_sales(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
) -> axum::response::Response {
    match services.orders.list_orders_for_buyer(token.as_str()).await {
        Ok(sales) => (StatusCode::OK, Json(sales)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_seller_sales(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
) -> axum::response::Response {
    match services.orders.list_orders_for_seller(token.as_str()).await {
        Ok(sales) => (StatusCode::OK, Json(sales)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SaleId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.orders.get_order(token.as_str(), id).await {
        Ok(details) => (StatusCode::OK, Json(details)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_sale_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SaleId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.orders.request_status_update(token.as_str(), id).await {
        Ok(change) => (StatusCode::OK, Json(change)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
