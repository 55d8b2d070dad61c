//! Storage error types
//!
//! Every operation that touches the review store returns [`StorageError`] on
//! failure. Callers never see `rusqlite` error shapes; the SQLite result code is
//! folded into one of four kinds at the point of origin.

use rusqlite::ErrorCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store could not be opened or is not a usable database.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// A row was rejected by a table constraint (e.g. the rating check).
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// The store lock could not be acquired within the configured timeout.
    #[error("store busy: {0}")]
    Busy(String),

    /// Any other store failure.
    #[error("storage error: {0}")]
    Unknown(String),
}

/// Kind of a [`StorageError`], without the detail message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageErrorKind {
    ConnectionFailed,
    ConstraintViolation,
    Busy,
    Unknown,
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageErrorKind::ConnectionFailed => write!(f, "connection failed"),
            StorageErrorKind::ConstraintViolation => write!(f, "constraint violation"),
            StorageErrorKind::Busy => write!(f, "busy"),
            StorageErrorKind::Unknown => write!(f, "unknown"),
        }
    }
}

impl StorageError {
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            StorageError::ConnectionFailed(_) => StorageErrorKind::ConnectionFailed,
            StorageError::ConstraintViolation(_) => StorageErrorKind::ConstraintViolation,
            StorageError::Busy(_) => StorageErrorKind::Busy,
            StorageError::Unknown(_) => StorageErrorKind::Unknown,
        }
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Busy(_))
    }

    /// Map a `rusqlite` error, prefixing the detail with what was being done.
    pub fn from_sqlite(context: &str, err: rusqlite::Error) -> Self {
        let detail = format!("{}: {}", context, err);
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                StorageError::Busy(detail)
            }
            Some(ErrorCode::ConstraintViolation) => StorageError::ConstraintViolation(detail),
            Some(ErrorCode::CannotOpen)
            | Some(ErrorCode::NotADatabase)
            | Some(ErrorCode::PermissionDenied)
            | Some(ErrorCode::SystemIoFailure)
            | Some(ErrorCode::DatabaseCorrupt)
            | Some(ErrorCode::NotFound) => StorageError::ConnectionFailed(detail),
            _ => StorageError::Unknown(detail),
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::from_sqlite("query failed", err)
    }
}
