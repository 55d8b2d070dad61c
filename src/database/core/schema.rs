//! Database schema management
//!
//! This module provides the schema definitions for the review store, and the
//! first-run seeding of sample reviews.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use super::error::StorageError;

/// Current schema version
/// Increment this when making breaking schema changes
pub const SCHEMA_VERSION: u32 = 1;

/// Meta key marking that sample data has been inserted once
const SEEDED_KEY: &str = "sample_data_seeded";

/// Schema definitions for all tables in the review store
pub struct SchemaDefinitions;

impl SchemaDefinitions {
    /// SQL for creating the meta table (tracks schema version and seeding)
    pub const META_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS reviews_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );
    "#;

    /// SQL for creating the reviews table
    pub const REVIEWS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            school_name TEXT NOT NULL,
            reviewer_name TEXT NOT NULL,
            rating INTEGER NOT NULL CHECK (rating >= 1 AND rating <= 5),
            comment TEXT NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );
    "#;

    pub const REVIEWS_INDEXES: &'static [&'static str] =
        &["CREATE INDEX IF NOT EXISTS idx_reviews_created_at ON reviews(created_at DESC, id DESC)"];

    /// Sample reviews inserted into a fresh store:
    /// (school_name, reviewer_name, rating, comment)
    pub const SAMPLE_REVIEWS: &'static [(&'static str, &'static str, u8, &'static str)] = &[
        (
            "ABC International School",
            "John Doe",
            5,
            "Excellent school with great faculty and infrastructure. My child loves going to school every day.",
        ),
        (
            "Springfield Elementary",
            "Jane Smith",
            4,
            "Good academic programs but could improve extracurricular activities.",
        ),
        (
            "Green Valley High School",
            "Mike Johnson",
            3,
            "Average school with decent facilities. Teachers are supportive but need more resources.",
        ),
        (
            "Riverside Academy",
            "Sarah Wilson",
            5,
            "Outstanding school with dedicated teachers and excellent facilities. Highly recommended!",
        ),
        (
            "Sunset Middle School",
            "David Brown",
            4,
            "Good school with strong academic programs. Could use more sports facilities.",
        ),
    ];
}

/// Outcome of [`SchemaManager::initialize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaReport {
    /// Whether sample reviews were inserted by this call
    pub seeded: bool,
    /// Number of reviews after initialization
    pub review_count: u64,
}

/// Schema manager for the review store
///
/// Operates on a connection handed out by the connection manager, normally
/// inside its write transaction so that creation and seeding are atomic.
pub struct SchemaManager<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaManager<'a> {
    /// Create a new schema manager for the given connection
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Initialize the database schema
    ///
    /// Idempotent. Creates the tables and indexes if they don't exist. Sample
    /// reviews are inserted only when `seed` is set, the reviews table is empty,
    /// and the store has never been seeded before.
    pub fn initialize(&self, seed: bool) -> Result<SchemaReport, StorageError> {
        if let SchemaStatus::Incompatible {
            database_version,
            required_version,
        } = self.check_status()?
        {
            return Err(StorageError::Unknown(format!(
                "review store schema v{} is newer than supported v{}",
                database_version, required_version
            )));
        }

        self.conn
            .execute(SchemaDefinitions::META_TABLE, [])
            .map_err(|e| StorageError::from_sqlite("failed to create meta table", e))?;

        self.set_meta("schema_version", &SCHEMA_VERSION.to_string())?;

        self.conn
            .execute(SchemaDefinitions::REVIEWS_TABLE, [])
            .map_err(|e| StorageError::from_sqlite("failed to create reviews table", e))?;

        for index_sql in SchemaDefinitions::REVIEWS_INDEXES {
            self.conn
                .execute(index_sql, [])
                .map_err(|e| StorageError::from_sqlite("failed to create reviews index", e))?;
        }

        let mut review_count = self.review_count()?;
        let mut seeded = false;

        if seed && review_count == 0 && self.get_meta(SEEDED_KEY)?.is_none() {
            review_count = self.seed_sample_reviews()?;
            self.set_meta(SEEDED_KEY, "true")?;
            seeded = true;
            info!("Inserted {} sample reviews", review_count);
        }

        info!("Review store initialized with {} reviews", review_count);
        Ok(SchemaReport {
            seeded,
            review_count,
        })
    }

    fn seed_sample_reviews(&self) -> Result<u64, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached(
                "INSERT INTO reviews (school_name, reviewer_name, rating, comment)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(|e| StorageError::from_sqlite("failed to prepare seed statement", e))?;

        for (school_name, reviewer_name, rating, comment) in SchemaDefinitions::SAMPLE_REVIEWS {
            stmt.execute(rusqlite::params![school_name, reviewer_name, rating, comment])
                .map_err(|e| StorageError::from_sqlite("failed to insert sample review", e))?;
        }

        Ok(SchemaDefinitions::SAMPLE_REVIEWS.len() as u64)
    }

    /// Check the current schema status
    pub fn check_status(&self) -> Result<SchemaStatus, StorageError> {
        if !self.table_exists("reviews_meta")? {
            return Ok(SchemaStatus::NotInitialized);
        }

        let version = match self.get_meta("schema_version")? {
            Some(v) => v
                .parse::<u32>()
                .map_err(|e| StorageError::Unknown(format!("invalid schema version: {}", e)))?,
            None => return Ok(SchemaStatus::NotInitialized),
        };

        if version > SCHEMA_VERSION {
            Ok(SchemaStatus::Incompatible {
                database_version: version,
                required_version: SCHEMA_VERSION,
            })
        } else if self.table_exists("reviews")? {
            Ok(SchemaStatus::Current)
        } else {
            Ok(SchemaStatus::NotInitialized)
        }
    }

    fn table_exists(&self, table_name: &str) -> Result<bool, StorageError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table_name],
                |row| row.get(0),
            )
            .map_err(|e| StorageError::from_sqlite("failed to check table existence", e))?;
        Ok(count > 0)
    }

    fn review_count(&self) -> Result<u64, StorageError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))
            .map_err(|e| StorageError::from_sqlite("failed to count reviews", e))
    }

    /// Set a metadata value
    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO reviews_meta (key, value, updated_at) VALUES (?1, ?2, strftime('%s', 'now'))",
                [key, value],
            )
            .map_err(|e| StorageError::from_sqlite("failed to set meta value", e))?;
        Ok(())
    }

    /// Get a metadata value
    pub fn get_meta(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.conn
            .query_row(
                "SELECT value FROM reviews_meta WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StorageError::from_sqlite("failed to get meta value", e))
    }
}

/// Status of the database schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    /// Database is not initialized (fresh database)
    NotInitialized,

    /// Schema is current and valid
    Current,

    /// Database is from a newer version (incompatible)
    Incompatible {
        database_version: u32,
        required_version: u32,
    },
}

impl std::fmt::Display for SchemaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaStatus::NotInitialized => write!(f, "not initialized"),
            SchemaStatus::Current => write!(f, "current (v{})", SCHEMA_VERSION),
            SchemaStatus::Incompatible {
                database_version,
                required_version,
            } => write!(
                f,
                "incompatible (db: v{}, required: v{})",
                database_version, required_version
            ),
        }
    }
}
