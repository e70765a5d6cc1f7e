//! SQLite-backed catalog store

use async_trait::async_trait;
use catalog_common::db::{insert_product, NewProduct};
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::{CatalogStore, StoreError, WriteOutcome};
use crate::grouping::CatalogRecord;
use crate::parity::NativeEncoder;

/// Run a query with an upper bound on how long it may take
async fn bounded<T, F>(timeout: Duration, op: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(timeout, op).await {
        Ok(result) => result.map_err(StoreError::from),
        Err(_) => Err(StoreError::Timeout(timeout)),
    }
}

pub struct SqliteCatalogStore {
    pool: SqlitePool,
    timeout: Duration,
    has_soundex: OnceCell<bool>,
}

impl SqliteCatalogStore {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self {
            pool,
            timeout,
            has_soundex: OnceCell::new(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn insert_product(&self, name: &str) -> Result<i64, StoreError> {
        insert_product(&self.pool, &NewProduct::named(name))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    /// Whether this SQLite build ships the optional `soundex()` function
    ///
    /// Only a definitive answer is cached. A probe that times out or hits a
    /// closed pool is retried on the next call.
    async fn probe_soundex(&self) -> bool {
        let probed = self
            .has_soundex
            .get_or_try_init(|| async {
                let probe = bounded(
                    self.timeout,
                    sqlx::query_scalar::<_, String>("SELECT soundex('Robert')")
                        .fetch_one(&self.pool),
                )
                .await;

                match probe {
                    Ok(code) => {
                        debug!("SQLite soundex() available (Robert -> {})", code);
                        Ok(true)
                    }
                    Err(e) if is_missing_function(&e) => {
                        debug!("SQLite soundex() unavailable: {}", e);
                        Ok(false)
                    }
                    Err(e) => Err(e),
                }
            })
            .await;

        match probed {
            Ok(available) => *available,
            Err(e) => {
                warn!("Could not probe for SQLite soundex(): {}", e);
                false
            }
        }
    }
}

fn is_missing_function(err: &StoreError) -> bool {
    match err {
        StoreError::Database(sqlx::Error::Database(db)) => {
            db.message().contains("no such function")
        }
        _ => false,
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn fetch_unverified(&self) -> Result<Vec<CatalogRecord>, StoreError> {
        let rows = bounded(
            self.timeout,
            sqlx::query_as::<_, (i64, String)>(
                r#"
                SELECT id, COALESCE(name, '')
                FROM products
                WHERE verified = 0
                ORDER BY name ASC, id ASC
                "#,
            )
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| CatalogRecord::unverified(id, name))
            .collect())
    }

    async fn set_verified(&self, id: i64) -> Result<WriteOutcome, StoreError> {
        let result = bounded(
            self.timeout,
            sqlx::query("UPDATE products SET verified = 1 WHERE id = ? AND verified = 0")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        Ok(outcome(result.rows_affected()))
    }

    async fn delete_record(&self, id: i64) -> Result<WriteOutcome, StoreError> {
        let result = bounded(
            self.timeout,
            sqlx::query("DELETE FROM products WHERE id = ?")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        Ok(outcome(result.rows_affected()))
    }

    async fn native_encoder(&self) -> Option<Arc<dyn NativeEncoder>> {
        if !self.probe_soundex().await {
            return None;
        }
        Some(Arc::new(SqliteSoundex {
            pool: self.pool.clone(),
            timeout: self.timeout,
        }))
    }
}

fn outcome(rows_affected: u64) -> WriteOutcome {
    if rows_affected == 0 {
        WriteOutcome::Unchanged
    } else {
        WriteOutcome::Applied
    }
}

/// SQLite's built-in `soundex()`, only present when compiled with SQLITE_SOUNDEX
pub struct SqliteSoundex {
    pool: SqlitePool,
    timeout: Duration,
}

#[async_trait]
impl NativeEncoder for SqliteSoundex {
    fn name(&self) -> &str {
        "sqlite soundex()"
    }

    async fn encode_batch(&self, names: &[String]) -> Result<Vec<String>, StoreError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        // One round trip: the names travel as a JSON array and come back in index order
        let batch =
            serde_json::to_string(names).map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let codes = bounded(
            self.timeout,
            sqlx::query_scalar::<_, String>(
                r#"
                SELECT soundex(value)
                FROM json_each(?)
                ORDER BY key
                "#,
            )
            .bind(batch)
            .fetch_all(&self.pool),
        )
        .await;

        if let Err(e) = &codes {
            warn!("soundex() failed for a batch of {} names: {}", names.len(), e);
        }
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parity::{check_parity, select_encoder, ParityError};
    use catalog_common::db::create_catalog_schema;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store() -> SqliteCatalogStore {
        // One connection: every in-memory connection is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_catalog_schema(&pool).await.unwrap();
        SqliteCatalogStore::new(pool, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn fetch_returns_unverified_sorted_by_name() {
        let store = store().await;
        let pepsi = store.insert_product("Pepsi").await.unwrap();
        let arroz = store.insert_product("Arroz").await.unwrap();
        let coca = store.insert_product("Coca Cola").await.unwrap();
        store.set_verified(coca).await.unwrap();

        let records = store.fetch_unverified().await.unwrap();
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();

        assert_eq!(ids, vec![arroz, pepsi]);
        assert!(records.iter().all(|r| !r.verified));
    }

    #[tokio::test]
    async fn null_names_read_as_empty() {
        let store = store().await;
        sqlx::query("INSERT INTO products (name) VALUES (NULL)")
            .execute(store.pool())
            .await
            .unwrap();

        let records = store.fetch_unverified().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "");
    }

    #[tokio::test]
    async fn verify_is_idempotent() {
        let store = store().await;
        let id = store.insert_product("Yerba").await.unwrap();

        assert_eq!(store.set_verified(id).await.unwrap(), WriteOutcome::Applied);
        assert_eq!(store.set_verified(id).await.unwrap(), WriteOutcome::Unchanged);
        assert_eq!(store.set_verified(9999).await.unwrap(), WriteOutcome::Unchanged);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = store().await;
        let id = store.insert_product("Yerba").await.unwrap();

        assert_eq!(store.delete_record(id).await.unwrap(), WriteOutcome::Applied);
        assert_eq!(store.delete_record(id).await.unwrap(), WriteOutcome::Unchanged);
        assert!(store.fetch_unverified().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn closed_pool_reports_database_error() {
        let store = store().await;
        store.pool().close().await;

        let err = store.fetch_unverified().await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn soundex_probe_result_is_cached() {
        let store = store().await;
        assert!(store.has_soundex.get().is_none());

        let offered = store.native_encoder().await.is_some();
        assert_eq!(store.has_soundex.get().copied(), Some(offered));
    }

    #[tokio::test]
    async fn failed_soundex_probe_is_not_cached() {
        let store = store().await;
        store.pool().close().await;

        assert!(store.native_encoder().await.is_none());
        assert!(store.has_soundex.get().is_none());
    }

    #[tokio::test]
    async fn sqlite_soundex_is_rejected_by_parity_gate() {
        let store = store().await;
        let Some(native) = store.native_encoder().await else {
            // This SQLite build has no soundex(); nothing to delegate to
            assert!(!select_encoder(&store, true).await.is_native());
            return;
        };

        // SQLite resets runs on h/w/y, so "Ashcraft" comes back A226
        match check_parity(native.as_ref()).await {
            Err(ParityError::Mismatch { name, actual, .. }) => {
                assert_eq!(name, "Ashcraft");
                assert_eq!(actual, "A226");
            }
            other => panic!("expected Ashcraft mismatch, got {:?}", other),
        }

        assert!(!select_encoder(&store, true).await.is_native());
    }

    #[tokio::test]
    async fn sqlite_soundex_batch_keeps_input_order() {
        let store = store().await;
        let Some(native) = store.native_encoder().await else {
            return;
        };

        let names: Vec<String> = ["Smith", "Robert", "Lee", "Jackson"]
            .iter()
            .map(|n| n.to_string())
            .collect();
        let codes = native.encode_batch(&names).await.unwrap();

        assert_eq!(codes, vec!["S530", "R163", "L000", "J250"]);
        assert!(native.encode_batch(&[]).await.unwrap().is_empty());
    }
}
