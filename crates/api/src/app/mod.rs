//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services/`: use-case services over the stores
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and their field rules
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use anyhow::Context;
use axum::{Extension, Router};
use tower::ServiceBuilder;

use bazaar_infra::PostgresStore;
use bazaar_products::starter_catalog;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::{AppServices, Stores};

/// Build the router over already-wired services.
pub fn build_router(services: Arc<AppServices>) -> Router {
    // Protected routes: a bearer token must be present; services verify it.
    let protected =
        routes::protected_router().layer(axum::middleware::from_fn(middleware::auth_middleware));

    routes::public_router()
        .merge(protected)
        .layer(Extension(services))
        .layer(ServiceBuilder::new())
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Opens the configured store, creates the bootstrap administrator and seeds
/// the starter catalog when it is empty.
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let stores = match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url)
                .await
                .context("failed to connect to the database")?;
            store
                .ensure_schema()
                .await
                .context("failed to create the database schema")?;
            tracing::info!("using postgres store");
            Stores::from_backend(Arc::new(store))
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory store");
            Stores::in_memory()
        }
    };

    let services = Arc::new(AppServices::from_config(config, stores));

    if let Some(admin) = &config.bootstrap_admin {
        services
            .users
            .ensure_admin(admin)
            .await
            .context("failed to create the bootstrap administrator")?;
    }

    let image_base_url = format!("{}/images", config.public_url.trim_end_matches('/'));
    services
        .products
        .seed_if_empty(starter_catalog(&image_base_url))
        .await
        .context("failed to seed the product catalog")?;

    Ok(build_router(services))
}
