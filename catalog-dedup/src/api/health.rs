//! Health check endpoint

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::store::CatalogStore;
use crate::AppState;

/// Health check response: status, module name, and version
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// GET /health
///
/// Does not touch the catalog store.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "catalog-dedup".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build health check routes
pub fn health_routes<S: CatalogStore + 'static>() -> Router<AppState<S>> {
    Router::new().route("/health", get(health_check))
}
