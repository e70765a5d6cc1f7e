//! catalog-dedup library - phonetic duplicate detection for the product catalog
//!
//! Product names are turned into Soundex-style codes, unverified products
//! sharing a code are grouped for manual review, and review decisions
//! (verify or delete) are written back to the catalog store.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod grouping;
pub mod parity;
pub mod phonetic;
pub mod review;
pub mod store;

pub use grouping::{group, CatalogRecord, DuplicateGroup, DuplicateGroups, GroupingOptions};
pub use phonetic::{encode, PhoneticCode};
pub use review::{DuplicateReport, DuplicateReview};
pub use store::{CatalogStore, WriteOutcome};

/// Application state shared across HTTP handlers
pub struct AppState<S> {
    pub review: Arc<DuplicateReview<S>>,
}

impl<S> AppState<S> {
    pub fn new(review: DuplicateReview<S>) -> Self {
        Self {
            review: Arc::new(review),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            review: Arc::clone(&self.review),
        }
    }
}

/// Build application router
pub fn build_router<S: CatalogStore + 'static>(state: AppState<S>) -> Router {
    use axum::routing::{delete, get, post};

    let review = Router::new()
        .route("/api/duplicates", get(api::list_duplicates::<S>))
        .route("/api/products/:id/verify", post(api::verify_product::<S>))
        .route("/api/products/:id", delete(api::delete_product::<S>));

    Router::new()
        .merge(review)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
