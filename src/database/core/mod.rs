//! Core database infrastructure
//!
//! This module provides the foundational database components used by the review store:
//! - `ConnectionManager`: scoped SQLite connections under a single-writer lock
//! - `SchemaManager`: schema initialization and first-run seeding
//! - `StorageError`: the error type every store operation returns

mod connection;
mod error;
mod schema;

pub use connection::{ConnectionManager, DEFAULT_BUSY_TIMEOUT};
pub use error::{StorageError, StorageErrorKind};
pub use schema::{SchemaDefinitions, SchemaManager, SchemaReport, SchemaStatus, SCHEMA_VERSION};
