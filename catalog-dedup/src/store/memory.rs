//! In-process catalog store
//!
//! Holds records in a map behind an async lock. Fetch and write failures can
//! be switched on to exercise the degraded paths of the review flow.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{CatalogStore, StoreError, WriteOutcome};
use crate::grouping::CatalogRecord;
use crate::parity::NativeEncoder;

#[derive(Default)]
pub struct MemoryCatalogStore {
    records: RwLock<BTreeMap<i64, CatalogRecord>>,
    last_id: AtomicI64,
    fail_fetch: AtomicBool,
    fail_writes: AtomicBool,
    native: Option<Arc<dyn NativeEncoder>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer `native` as this store's phonetic function
    pub fn with_native_encoder(mut self, native: Arc<dyn NativeEncoder>) -> Self {
        self.native = Some(native);
        self
    }

    pub async fn insert(&self, name: &str) -> i64 {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.records
            .write()
            .await
            .insert(id, CatalogRecord::unverified(id, name));
        id
    }

    pub async fn get(&self, id: i64) -> Option<CatalogRecord> {
        self.records.read().await.get(&id).cloned()
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn fetch_unverified(&self) -> Result<Vec<CatalogRecord>, StoreError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("fetch disabled".to_string()));
        }

        let mut records: Vec<CatalogRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| !r.verified)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn set_verified(&self, id: i64) -> Result<WriteOutcome, StoreError> {
        self.check_writes()?;

        match self.records.write().await.get_mut(&id) {
            Some(record) if !record.verified => {
                record.verified = true;
                Ok(WriteOutcome::Applied)
            }
            _ => Ok(WriteOutcome::Unchanged),
        }
    }

    async fn delete_record(&self, id: i64) -> Result<WriteOutcome, StoreError> {
        self.check_writes()?;

        Ok(match self.records.write().await.remove(&id) {
            Some(_) => WriteOutcome::Applied,
            None => WriteOutcome::Unchanged,
        })
    }

    async fn native_encoder(&self) -> Option<Arc<dyn NativeEncoder>> {
        self.native.clone()
    }
}
