//! Review repository
//!
//! The only query surface over the `reviews` table. Stored reviews are never
//! updated or deleted. Nothing is cached;
//! every read goes back to the store.

use tracing::{debug, info};

use crate::database::core::{ConnectionManager, StorageError};
use crate::review::{NewReview, Review, ReviewId, REVIEW_COLUMNS};

/// Repository for review operations
pub struct ReviewRepository<'a> {
    manager: &'a ConnectionManager,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository
    pub fn new(manager: &'a ConnectionManager) -> Self {
        Self { manager }
    }

    /// Store a validated review and return its new id
    pub fn insert(&self, review: &NewReview) -> Result<ReviewId, StorageError> {
        let id = self.manager.with_connection(|conn| {
            conn.execute(
                "INSERT INTO reviews (school_name, reviewer_name, rating, comment)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    review.school_name(),
                    review.reviewer_name(),
                    review.rating(),
                    review.comment(),
                ],
            )
            .map_err(|e| StorageError::from_sqlite("failed to insert review", e))?;
            Ok(conn.last_insert_rowid())
        })?;

        info!(
            "Review {} added: {} by {}",
            id,
            review.school_name(),
            review.reviewer_name()
        );
        Ok(id)
    }

    /// All reviews, newest first (ties broken by id, newest first)
    pub fn list_all(&self) -> Result<Vec<Review>, StorageError> {
        let reviews = self.manager.with_read_connection(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM reviews ORDER BY created_at DESC, id DESC",
                    REVIEW_COLUMNS
                ))
                .map_err(|e| StorageError::from_sqlite("failed to prepare review query", e))?;

            let rows = stmt
                .query_map([], Review::from_row)
                .map_err(|e| StorageError::from_sqlite("failed to query reviews", e))?;

            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| StorageError::from_sqlite("failed to read review row", e))
        })?;

        debug!("Loaded {} reviews", reviews.len());
        Ok(reviews)
    }

    /// Number of stored reviews
    pub fn count(&self) -> Result<u64, StorageError> {
        self.manager.with_read_connection(|conn| {
            conn.query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))
                .map_err(|e| StorageError::from_sqlite("failed to count reviews", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::{SchemaManager, StorageErrorKind, DEFAULT_BUSY_TIMEOUT};
    use crate::review::{validate, ReviewCandidate};
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, ConnectionManager) {
        let dir = tempdir().unwrap();
        let manager = ConnectionManager::new(dir.path().join("reviews.db"), DEFAULT_BUSY_TIMEOUT);
        manager
            .with_connection(|conn| SchemaManager::new(conn).initialize(false))
            .unwrap();
        (dir, manager)
    }

    fn new_review(school: &str, rating: &str) -> NewReview {
        validate(&ReviewCandidate::new(school, "Tester", rating, "Some comment")).unwrap()
    }

    #[test]
    fn test_insert_then_list_round_trip() {
        let (_dir, manager) = setup();
        let repo = ReviewRepository::new(&manager);

        let input = validate(&ReviewCandidate::new(
            "  Riverside Academy ",
            " Sarah ",
            "5",
            " Outstanding ",
        ))
        .unwrap();
        let id = repo.insert(&input).unwrap();

        let reviews = repo.list_all().unwrap();
        let first = &reviews[0];
        assert_eq!(first.id, id);
        assert_eq!(first.school_name, "Riverside Academy");
        assert_eq!(first.reviewer_name, "Sarah");
        assert_eq!(first.rating, 5);
        assert_eq!(first.comment, "Outstanding");
        assert!(first.created_at.as_datetime().is_some());
    }

    #[test]
    fn test_list_is_reverse_insertion_order() {
        let (_dir, manager) = setup();
        let repo = ReviewRepository::new(&manager);

        let ids: Vec<ReviewId> = ["First", "Second", "Third"]
            .iter()
            .map(|school| repo.insert(&new_review(school, "3")).unwrap())
            .collect();

        let listed: Vec<ReviewId> = repo.list_all().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn test_newer_timestamp_sorts_first() {
        let (_dir, manager) = setup();
        let repo = ReviewRepository::new(&manager);

        let newer = repo.insert(&new_review("Newer", "4")).unwrap();
        manager
            .with_connection(|conn| {
                conn.execute(
                    "INSERT INTO reviews (school_name, reviewer_name, rating, comment, created_at)
                     VALUES ('Older', 'Tester', 2, 'Old', '2001-01-01 00:00:00')",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        let reviews = repo.list_all().unwrap();
        assert_eq!(reviews[0].id, newer);
        assert_eq!(reviews[1].school_name, "Older");
    }

    #[test]
    fn test_count() {
        let (_dir, manager) = setup();
        let repo = ReviewRepository::new(&manager);

        assert_eq!(repo.count().unwrap(), 0);
        repo.insert(&new_review("A", "1")).unwrap();
        repo.insert(&new_review("B", "2")).unwrap();
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_missing_table_is_an_error_not_empty() {
        let dir = tempdir().unwrap();
        let manager = ConnectionManager::new(dir.path().join("empty.db"), DEFAULT_BUSY_TIMEOUT);
        let repo = ReviewRepository::new(&manager);

        let err = repo.list_all().unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::Unknown);
        assert!(repo.count().is_err());
    }

    #[test]
    fn test_unreachable_store_surfaces_error() {
        let dir = tempdir().unwrap();
        let manager = ConnectionManager::new(
            dir.path().join("no-such-dir").join("reviews.db"),
            DEFAULT_BUSY_TIMEOUT,
        );
        let repo = ReviewRepository::new(&manager);

        let err = repo.list_all().unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::ConnectionFailed);

        let err = repo.insert(&new_review("A", "3")).unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::ConnectionFailed);
    }
}
