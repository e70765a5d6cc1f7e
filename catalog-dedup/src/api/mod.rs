//! HTTP API handlers for catalog-dedup

pub mod duplicates;
pub mod health;

pub use duplicates::{delete_product, list_duplicates, verify_product};
pub use health::health_routes;
