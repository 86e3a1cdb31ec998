use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use bazaar_core::UserId;

use crate::app::dto::{LoginRequest, RegisterRequest, ValidatedJson};
use crate::app::{errors, routes::parse_id, services::AppServices};
use crate::middleware::BearerToken;

/// Token-protected user routes (registration and login are public).
pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/sellers", get(list_sellers))
        .route("/:id", get(get_user))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> axum::response::Response {
    match services.users.register(body.into_account()).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> axum::response::Response {
    match services.users.login(&body.email, &body.password).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
) -> axum::response::Response {
    match services.users.list_users(token.as_str()).await {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_sellers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
) -> axum::response::Response {
    match services.users.list_sellers(token.as_str()).await {
        Ok(sellers) => (StatusCode::OK, Json(sellers)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.users.get_user(token.as_str(), id).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
