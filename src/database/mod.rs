//! Database module
//!
//! This module provides all storage functionality for the review store, organized into:
//!
//! - **core**: Core database infrastructure (scoped connections, schema, errors)
//! - **reviews**: The review database and its repository
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/             # Foundation
//! │   ├── connection    # ConnectionManager: lock, open, transaction, close
//! │   ├── error         # StorageError and its kinds
//! │   └── schema        # Table definitions, status, first-run seeding
//! │
//! └── reviews/          # Review storage
//!     └── repository    # insert / list_all / count
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use school_reviews::database::ReviewDatabase;
//! use school_reviews::review::{validate, ReviewCandidate};
//!
//! let db = ReviewDatabase::new("reviews.sqlite3", DEFAULT_BUSY_TIMEOUT);
//! db.ensure_schema()?;
//!
//! let review = validate(&ReviewCandidate::new("Riverside Academy", "Sarah", "5", "Great"))?;
//! let id = db.reviews().insert(&review)?;
//!
//! for review in db.reviews().list_all()? {
//!     println!("{} {}: {}", review.id, review.school_name, review.rating);
//! }
//! ```

pub mod core;
pub mod reviews;

pub use core::{
    ConnectionManager, SchemaDefinitions, SchemaManager, SchemaReport, SchemaStatus,
    StorageError, StorageErrorKind, DEFAULT_BUSY_TIMEOUT, SCHEMA_VERSION,
};
pub use reviews::{ReviewDatabase, ReviewRepository};

/// Ensure the data directory exists
pub fn ensure_data_dir(data_dir: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create data directory '{}': {}", data_dir, e))
}
