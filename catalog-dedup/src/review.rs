//! Duplicate review: fetch-and-group plus the verification gate
//!
//! Every call to [`DuplicateReview::find_duplicates`] reads a fresh snapshot
//! of unverified records; nothing is cached between calls, so a verify or
//! delete is visible to the very next run and never to a report already
//! handed out.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::grouping::{group, group_coded, CatalogRecord, DuplicateGroups, GroupingOptions};
use crate::parity::{EncoderChoice, NativeEncoder};
use crate::phonetic::{encode, PhoneticCode};
use crate::store::{CatalogStore, StoreError, WriteOutcome};

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Catalog store write failed: {0}")]
    Store(#[from] StoreError),
}

/// One duplicate-detection run
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateReport {
    pub groups: DuplicateGroups,
    pub group_count: usize,
    /// Records in the snapshot that was grouped
    pub unverified_count: usize,
    /// The snapshot could not be read; `groups` is empty
    pub degraded: bool,
    pub generated_at: DateTime<Utc>,
}

impl DuplicateReport {
    fn new(groups: DuplicateGroups, unverified_count: usize) -> Self {
        Self {
            group_count: groups.len(),
            groups,
            unverified_count,
            degraded: false,
            generated_at: Utc::now(),
        }
    }

    fn degraded() -> Self {
        Self {
            degraded: true,
            ..Self::new(DuplicateGroups::default(), 0)
        }
    }
}

pub struct DuplicateReview<S> {
    store: Arc<S>,
    options: GroupingOptions,
    encoder: EncoderChoice,
}

impl<S: CatalogStore> DuplicateReview<S> {
    pub fn new(store: Arc<S>, options: GroupingOptions) -> Self {
        Self {
            store,
            options,
            encoder: EncoderChoice::InProcess,
        }
    }

    pub fn with_encoder(mut self, encoder: EncoderChoice) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn encoder(&self) -> &EncoderChoice {
        &self.encoder
    }

    /// Group the current unverified records by sound
    ///
    /// Store failures never surface here: they are logged and reported as
    /// an empty, `degraded` report.
    pub async fn find_duplicates(&self) -> DuplicateReport {
        let snapshot = match self.store.fetch_unverified().await {
            Ok(records) => records,
            Err(e) => {
                error!("Duplicate scan could not read catalog: {}", e);
                return DuplicateReport::degraded();
            }
        };

        let total = snapshot.len();
        let snapshot: Vec<CatalogRecord> =
            snapshot.into_iter().filter(|r| !r.verified).collect();
        if snapshot.len() != total {
            warn!(
                "Store returned {} verified records in an unverified snapshot; ignoring them",
                total - snapshot.len()
            );
        }

        let unverified_count = snapshot.len();
        let groups = match &self.encoder {
            EncoderChoice::InProcess => group(snapshot, self.options),
            EncoderChoice::Native(native) => {
                match encode_natively(native.as_ref(), snapshot).await {
                    Ok(coded) => group_coded(coded, self.options),
                    Err(e) => {
                        error!("Native phonetic encoding failed: {}", e);
                        return DuplicateReport::degraded();
                    }
                }
            }
        };

        debug!(
            "Duplicate scan: {} unverified records, {} groups",
            unverified_count,
            groups.len()
        );

        DuplicateReport::new(groups, unverified_count)
    }

    /// Mark a record as reviewed so it never enters grouping again
    pub async fn mark_verified(&self, id: i64) -> Result<WriteOutcome, ReviewError> {
        let outcome = self.store.set_verified(id).await.map_err(|e| {
            warn!("Verify of product {} failed: {}", id, e);
            e
        })?;
        info!("Product {} verified ({:?})", id, outcome);
        Ok(outcome)
    }

    /// Permanently remove a record from the catalog
    pub async fn delete(&self, id: i64) -> Result<WriteOutcome, ReviewError> {
        let outcome = self.store.delete_record(id).await.map_err(|e| {
            warn!("Delete of product {} failed: {}", id, e);
            e
        })?;
        info!("Product {} deleted ({:?})", id, outcome);
        Ok(outcome)
    }
}

/// Pair each record with the code the native function assigns it
///
/// Names without ASCII letters keep the empty code without asking the
/// backend; a malformed native code falls back to the in-process one.
async fn encode_natively(
    native: &dyn NativeEncoder,
    records: Vec<CatalogRecord>,
) -> Result<Vec<(PhoneticCode, CatalogRecord)>, StoreError> {
    let names: Vec<String> = records
        .iter()
        .filter(|r| !encode(&r.name).is_empty())
        .map(|r| r.name.clone())
        .collect();

    let codes = native.encode_batch(&names).await?;
    if codes.len() != names.len() {
        return Err(StoreError::Unavailable(format!(
            "{} returned {} codes for {} names",
            native.name(),
            codes.len(),
            names.len()
        )));
    }

    let mut codes = codes.into_iter();
    Ok(records
        .into_iter()
        .map(|record| {
            let local = encode(&record.name);
            if local.is_empty() {
                return (local, record);
            }

            let raw = codes.next().unwrap_or_default();
            let code = PhoneticCode::parse(&raw).unwrap_or_else(|| {
                warn!("{} produced malformed code {:?}", native.name(), raw);
                local
            });
            (code, record)
        })
        .collect())
}
