#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! School Reviews - submit and browse reviews of schools
//!
//! The crate is built around a small, synchronous review store on SQLite.
//! An HTTP front end (HTML pages and a JSON feed) and a command-line interface
//! sit on top of it behind feature flags.
//!
//! # Feature Flags
//!
//! | Feature   | Description                                  | Key Dependencies          |
//! |-----------|----------------------------------------------|---------------------------|
//! | (none)    | Review store, validation, projection, config | `rusqlite`, `config`      |
//! | `display` | Table formatting with `tabled`               | `tabled`                  |
//! | `server`  | HTTP pages, JSON feed, health check          | `axum`, `tokio`           |
//! | `cli`     | Full CLI binary with server support          | All above + `clap`        |
//!
//! # Architecture
//!
//! - **[`review`]**: the review entity, acceptance rules, and row/JSON/display projection
//! - **[`database`]**: connection management, schema initialization, the review repository
//! - **[`config`]**: process-wide configuration, loaded once at startup
//! - **[`output`]**: output formats for listing reviews
//! - **`server`**: the HTTP route layer (feature `server`)
//!
//! Data flows from route handlers to [`ReviewRepository`] operations, through the
//! [`ConnectionManager`] to SQLite, and back as typed [`Review`] records or a
//! typed [`StorageError`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use school_reviews::{validate, ReviewCandidate, ReviewDatabase, ReviewsConfig};
//!
//! let config = ReviewsConfig::new(&None)?;
//! let db = ReviewDatabase::from_config(&config);
//!
//! // Fatal if this fails: the store is unusable
//! db.ensure_schema()?;
//!
//! match validate(&ReviewCandidate::new("Riverside Academy", "Sarah", "5", "Great teachers")) {
//!     Ok(review) => {
//!         let id = db.reviews().insert(&review)?;
//!         println!("stored review {}", id);
//!     }
//!     Err(e) => {
//!         for message in e.messages() {
//!             eprintln!("{}", message);
//!         }
//!     }
//! }
//!
//! for review in db.reviews().list_all()? {
//!     println!("{}: {}/5 ({})", review.school_name, review.rating, review.created_at);
//! }
//! ```

pub mod config;
pub mod database;
pub mod output;
pub mod review;

#[cfg(feature = "server")]
pub mod server;

// =============================================================================
// Configuration
// =============================================================================

pub use config::{format_size, get_database_info, DatabaseInfo, ReviewsConfig};

// =============================================================================
// Database
// =============================================================================

pub use database::{
    ConnectionManager, ReviewDatabase, ReviewRepository, SchemaReport, SchemaStatus,
    StorageError, StorageErrorKind, DEFAULT_BUSY_TIMEOUT, SCHEMA_VERSION,
};

// =============================================================================
// Review entity
// =============================================================================

pub use review::{
    validate, NewReview, Review, ReviewCandidate, ReviewField, ReviewId, ReviewTimestamp,
    ValidationError, Violation,
};

pub use output::OutputFormat;

#[cfg(feature = "server")]
pub use server::{create_router, start_server, ServerConfig, ServerState};
