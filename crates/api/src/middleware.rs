use axum::{
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::errors;

/// Raw bearer token of the current request.
///
/// Only extracted here; every service call verifies it.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub const TOKEN_NOT_FOUND: &str = "Token not found";

/// Reject requests without an `Authorization` header and expose the token
/// to handlers as a [`BearerToken`] extension.
pub async fn auth_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Some(token) => token.to_string(),
        None => return errors::json_error(
            axum::http::StatusCode::UNAUTHORIZED,
            "unauthorized",
            TOKEN_NOT_FOUND,
        ),
    };

    req.extensions_mut().insert(BearerToken(token));
    next.run(req).await
}

/// Accepts both `Bearer <token>` and the bare token.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();

    let token = match header.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ if header.eq_ignore_ascii_case("bearer") => "",
        _ => header,
    };

    if token.is_empty() { None } else { Some(token) }
}
