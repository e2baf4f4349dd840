// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the catalog, queue, and location-store traits.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use medfinder_config::model::{StorageConfig, WorkerConfig};
use medfinder_core::{
    AdapterType, CatalogAdapter, CatalogEntry, HealthStatus, LocationStore, MedfinderError,
    PluginAdapter, QueueAdapter, QueueEntry, RetryDisposition, UserLocation,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// One database holds the catalog, the work queue, and the optional location
/// memory. The connection is opened by [`SqliteStorage::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    max_attempts: i32,
    lock_secs: u64,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage. Claimed queue entries stay locked for twice
    /// the job timeout before another worker may reclaim them.
    pub fn new(config: StorageConfig, worker: &WorkerConfig) -> Self {
        Self {
            config,
            max_attempts: worker.max_attempts,
            lock_secs: worker.job_timeout_secs.saturating_mul(2),
            db: OnceCell::new(),
        }
    }

    /// Open the database and run migrations.
    pub async fn initialize(&self) -> Result<(), MedfinderError> {
        let db = Database::open(&self.config.database_path).await?;
        self.db.set(db).map_err(|_| MedfinderError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// The underlying database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, MedfinderError> {
        self.db.get().ok_or_else(|| MedfinderError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self) -> Result<(), MedfinderError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                })
                .await
                .map_err(map_tr_err)?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Catalog
    }

    async fn health_check(&self) -> Result<HealthStatus, MedfinderError> {
        let db = self.db()?;
        let in_stock = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM medicines WHERE quantity > 0", [], |row| {
                    row.get(0)
                })
            })
            .await
            .map_err(map_tr_err)?;
        if in_stock == 0 {
            return Ok(HealthStatus::Degraded("catalog has no stocked medicines".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MedfinderError> {
        self.checkpoint().await
    }
}

#[async_trait]
impl CatalogAdapter for SqliteStorage {
    async fn find_exact(&self, term: &str) -> Result<Vec<CatalogEntry>, MedfinderError> {
        queries::catalog::find_exact(self.db()?, term).await
    }

    async fn find_containing(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, MedfinderError> {
        queries::catalog::find_containing(self.db()?, term, limit).await
    }

    async fn find_any_word(
        &self,
        words: &[String],
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, MedfinderError> {
        queries::catalog::find_any_word(self.db()?, words, limit).await
    }
}

#[async_trait]
impl QueueAdapter for SqliteStorage {
    async fn enqueue(&self, queue_name: &str, payload: &str) -> Result<i64, MedfinderError> {
        queries::queue::enqueue(self.db()?, queue_name, payload, self.max_attempts).await
    }

    async fn dequeue(&self, queue_name: &str) -> Result<Option<QueueEntry>, MedfinderError> {
        queries::queue::dequeue(self.db()?, queue_name, self.lock_secs).await
    }

    async fn ack(&self, id: i64) -> Result<(), MedfinderError> {
        queries::queue::ack(self.db()?, id).await
    }

    async fn fail(&self, id: i64, backoff: Duration) -> Result<RetryDisposition, MedfinderError> {
        queries::queue::fail(self.db()?, id, backoff.as_secs()).await
    }

    async fn discard(&self, id: i64) -> Result<(), MedfinderError> {
        queries::queue::discard(self.db()?, id).await
    }
}

#[async_trait]
impl LocationStore for SqliteStorage {
    async fn get(&self, user: &str) -> Result<Option<UserLocation>, MedfinderError> {
        queries::locations::get(self.db()?, user).await
    }

    async fn put(&self, user: &str, location: UserLocation) -> Result<(), MedfinderError> {
        queries::locations::put(self.db()?, user, location).await
    }
}
