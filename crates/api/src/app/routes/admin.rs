//! Administrator-only user management.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post},
    Json, Router,
};

use bazaar_core::UserId;

use crate::app::dto::{AdminCreateUserRequest, ValidatedJson};
use crate::app::{errors, routes::parse_id, services::AppServices};
use crate::middleware::BearerToken;

pub fn router() -> Router {
    Router::new()
        .route("/create/user", post(create_user))
        .route("/delete/user/:id", delete(delete_user))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    ValidatedJson(body): ValidatedJson<AdminCreateUserRequest>,
) -> axum::response::Response {
    let account = match body.into_account() {
        Ok(account) => account,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.users.create_user_as_admin(token.as_str(), account).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<BearerToken>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UserId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.users.delete_user(token.as_str(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
