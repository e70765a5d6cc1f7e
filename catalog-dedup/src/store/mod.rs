//! Catalog store boundary
//!
//! Duplicate detection reads unverified records and writes review decisions
//! through [`CatalogStore`]. Adapters own their timeout policy; the engine
//! never retries.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::grouping::CatalogRecord;
use crate::parity::NativeEncoder;

mod memory;
mod sqlite;

pub use memory::MemoryCatalogStore;
pub use sqlite::{SqliteCatalogStore, SqliteSoundex};

/// Store failures, all of them recoverable by retrying
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store call exceeded {0:?}")]
    Timeout(Duration),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Effect of an idempotent write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// The store changed
    Applied,
    /// Nothing to do: already verified, already deleted, or unknown id
    Unchanged,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All records not yet verified, ordered by name
    async fn fetch_unverified(&self) -> Result<Vec<CatalogRecord>, StoreError>;

    async fn set_verified(&self, id: i64) -> Result<WriteOutcome, StoreError>;

    async fn delete_record(&self, id: i64) -> Result<WriteOutcome, StoreError>;

    /// Phonetic function offered by the backend itself, if any
    async fn native_encoder(&self) -> Option<Arc<dyn NativeEncoder>> {
        None
    }
}
