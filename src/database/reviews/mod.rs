//! Review store
//!
//! [`ReviewDatabase`] owns the connection manager for the review database file
//! and hands out the repository. It is cheap to share behind an `Arc`.

mod repository;

pub use repository::ReviewRepository;

use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::ReviewsConfig;
use crate::database::core::{
    ConnectionManager, SchemaManager, SchemaReport, SchemaStatus, StorageError,
};

/// Main review database (SQLite backend)
pub struct ReviewDatabase {
    manager: ConnectionManager,
    seed_sample_data: bool,
}

impl ReviewDatabase {
    /// Create a review database for the given file.
    ///
    /// No connection is opened here; call [`ensure_schema`](Self::ensure_schema)
    /// once at startup.
    pub fn new(path: impl AsRef<Path>, timeout: Duration) -> Self {
        Self {
            manager: ConnectionManager::new(path.as_ref(), timeout),
            seed_sample_data: true,
        }
    }

    /// Create a review database from the loaded configuration
    pub fn from_config(config: &ReviewsConfig) -> Self {
        Self {
            manager: ConnectionManager::new(config.database_path(), config.busy_timeout())
                .with_shared_read_lock(config.share_read_lock),
            seed_sample_data: config.seed_sample_data,
        }
    }

    /// Whether a fresh store is seeded with sample reviews (default: true)
    pub fn with_sample_data(mut self, seed: bool) -> Self {
        self.seed_sample_data = seed;
        self
    }

    /// Whether reads share the writer lock (default: true)
    pub fn with_shared_read_lock(mut self, share: bool) -> Self {
        self.manager = self.manager.with_shared_read_lock(share);
        self
    }

    /// Create the schema if needed and seed a fresh store.
    ///
    /// Idempotent; safe to call on every start. A failure here means the store
    /// is unusable and the process should not start serving.
    pub fn ensure_schema(&self) -> Result<SchemaReport, StorageError> {
        info!(
            "Initializing review store at {}",
            self.manager.path().display()
        );
        self.manager
            .with_connection(|conn| SchemaManager::new(conn).initialize(self.seed_sample_data))
    }

    /// Check the schema status without creating or modifying the file
    pub fn schema_status(&self) -> Result<SchemaStatus, StorageError> {
        self.inspect().map(|(status, _)| status)
    }

    /// Schema status and, for a current schema, the number of reviews.
    ///
    /// Reads through a read-only connection: a missing file is reported as
    /// not initialized and is not created, and an existing file keeps its
    /// journal mode.
    pub fn inspect(&self) -> Result<(SchemaStatus, Option<u64>), StorageError> {
        if !self.path().exists() {
            return Ok((SchemaStatus::NotInitialized, None));
        }

        self.manager.with_read_only_connection(|conn| {
            let status = SchemaManager::new(conn).check_status()?;
            let count = match status {
                SchemaStatus::Current => Some(
                    conn.query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))
                        .map_err(|e| StorageError::from_sqlite("failed to count reviews", e))?,
                ),
                _ => None,
            };
            Ok((status, count))
        })
    }

    /// Get the review repository
    pub fn reviews(&self) -> ReviewRepository<'_> {
        ReviewRepository::new(&self.manager)
    }

    pub fn path(&self) -> &Path {
        self.manager.path()
    }
}
