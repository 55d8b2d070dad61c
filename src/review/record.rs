//! Review records and row projection
//!
//! [`Review::from_row`] turns a raw `reviews` row into the record shape used by
//! the JSON feed and the HTML pages. Timestamps are parsed when possible and
//! otherwise kept verbatim; projection never fails on a timestamp.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_humanize::HumanTime;
use rusqlite::types::{Type, ValueRef};
use rusqlite::Row;
use serde::{Serialize, Serializer};
use std::fmt;

/// Store-assigned review identifier
pub type ReviewId = i64;

/// Column list matching [`Review::from_row`]
pub const REVIEW_COLUMNS: &str = "id, school_name, reviewer_name, rating, comment, created_at";

/// Text layouts SQLite produces for `CURRENT_TIMESTAMP` and `strftime`
const SQLITE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A persisted review
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub school_name: String,
    pub reviewer_name: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: ReviewTimestamp,
}

/// Creation time of a review
///
/// Serializes as RFC 3339 (`2025-01-31T09:30:00Z`) when parsed, or as the
/// stored text when it could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewTimestamp {
    Parsed(DateTime<Utc>),
    Raw(String),
}

impl ReviewTimestamp {
    /// Parse stored text, falling back to the raw value.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return ReviewTimestamp::Parsed(dt.with_timezone(&Utc));
        }

        // SQLite timestamps carry no offset and are UTC
        for format in SQLITE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
                return ReviewTimestamp::Parsed(Utc.from_utc_datetime(&naive));
            }
        }

        ReviewTimestamp::Raw(raw.to_string())
    }

    fn from_unix(secs: i64) -> Self {
        match Utc.timestamp_opt(secs, 0).single() {
            Some(dt) => ReviewTimestamp::Parsed(dt),
            None => ReviewTimestamp::Raw(secs.to_string()),
        }
    }

    fn from_value(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Text(bytes) => Self::parse(&String::from_utf8_lossy(bytes)),
            ValueRef::Integer(secs) => Self::from_unix(secs),
            ValueRef::Real(secs) => Self::from_unix(secs as i64),
            ValueRef::Null => ReviewTimestamp::Raw(String::new()),
            ValueRef::Blob(bytes) => {
                ReviewTimestamp::Raw(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            ReviewTimestamp::Parsed(dt) => Some(dt),
            ReviewTimestamp::Raw(_) => None,
        }
    }

    /// ISO-8601 text used by JSON consumers
    pub fn to_iso8601(&self) -> String {
        match self {
            ReviewTimestamp::Parsed(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
            ReviewTimestamp::Raw(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for ReviewTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso8601())
    }
}

impl Serialize for ReviewTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl Review {
    /// Project a row selected with [`REVIEW_COLUMNS`].
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let rating: i64 = row.get(3)?;
        let rating = u8::try_from(rating).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(e))
        })?;

        Ok(Review {
            id: row.get(0)?,
            school_name: row.get(1)?,
            reviewer_name: row.get(2)?,
            rating,
            comment: row.get(4)?,
            created_at: ReviewTimestamp::from_value(row.get_ref(5)?),
        })
    }

    /// Derived, display-only projection of this review
    pub fn display(&self) -> ReviewDisplay<'_> {
        ReviewDisplay { review: self }
    }
}

/// Human-readable renderings of a review's fields
pub struct ReviewDisplay<'a> {
    review: &'a Review,
}

impl ReviewDisplay<'_> {
    /// e.g. `January 31, 2025`
    pub fn date(&self) -> String {
        self.format_or("%B %d, %Y", "Unknown date")
    }

    /// e.g. `01/31/2025`
    pub fn date_short(&self) -> String {
        self.format_or("%m/%d/%Y", "N/A")
    }

    /// e.g. `3 days ago`, relative to now
    pub fn relative(&self) -> Option<String> {
        self.review
            .created_at
            .as_datetime()
            .map(|dt| HumanTime::from(*dt - Utc::now()).to_string())
    }

    /// Filled and empty stars for the rating, e.g. `★★★★☆`
    pub fn stars(&self) -> String {
        let filled = usize::from(self.review.rating.min(5));
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }

    fn format_or(&self, format: &str, empty: &str) -> String {
        match &self.review.created_at {
            ReviewTimestamp::Parsed(dt) => dt.format(format).to_string(),
            ReviewTimestamp::Raw(raw) if raw.trim().is_empty() => empty.to_string(),
            ReviewTimestamp::Raw(raw) => raw.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn review_with(created_at: ReviewTimestamp) -> Review {
        Review {
            id: 1,
            school_name: "Riverside Academy".into(),
            reviewer_name: "Sarah".into(),
            rating: 4,
            comment: "Great".into(),
            created_at,
        }
    }

    #[test]
    fn test_parse_sqlite_current_timestamp() {
        let ts = ReviewTimestamp::parse("2025-01-31 09:30:00");
        assert_eq!(ts.to_iso8601(), "2025-01-31T09:30:00Z");
    }

    #[test]
    fn test_parse_fractional_and_rfc3339() {
        let ts = ReviewTimestamp::parse("2025-01-31 09:30:00.250");
        assert_eq!(ts.to_iso8601(), "2025-01-31T09:30:00Z");

        let ts = ReviewTimestamp::parse("2025-01-31T11:30:00+02:00");
        assert_eq!(ts.to_iso8601(), "2025-01-31T09:30:00Z");
    }

    #[test]
    fn test_unparseable_timestamp_kept_raw() {
        let ts = ReviewTimestamp::parse("last tuesday");
        assert_eq!(ts, ReviewTimestamp::Raw("last tuesday".into()));
        assert_eq!(ts.to_iso8601(), "last tuesday");
    }

    #[test]
    fn test_serialize_review() {
        let review = review_with(ReviewTimestamp::parse("2025-01-31 09:30:00"));
        let json = serde_json::to_value(&review).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["rating"], 4);
        assert_eq!(json["created_at"], "2025-01-31T09:30:00Z");
    }

    #[test]
    fn test_display_projection() {
        let review = review_with(ReviewTimestamp::parse("2025-01-31 09:30:00"));
        let display = review.display();

        assert_eq!(display.date(), "January 31, 2025");
        assert_eq!(display.date_short(), "01/31/2025");
        assert!(display.relative().is_some());
        assert_eq!(display.stars(), "★★★★☆");

        let review = review_with(ReviewTimestamp::Raw(String::new()));
        assert_eq!(review.display().date(), "Unknown date");
        assert_eq!(review.display().date_short(), "N/A");
        assert!(review.display().relative().is_none());
    }

    #[test]
    fn test_from_row_handles_odd_timestamps() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE reviews (id INTEGER PRIMARY KEY, school_name TEXT, reviewer_name TEXT,
                                   rating INTEGER, comment TEXT, created_at TIMESTAMP);
             INSERT INTO reviews VALUES (1, 'A', 'B', 5, 'C', '2025-01-31 09:30:00');
             INSERT INTO reviews VALUES (2, 'A', 'B', 5, 'C', NULL);
             INSERT INTO reviews VALUES (3, 'A', 'B', 5, 'C', 1738315800);
             INSERT INTO reviews VALUES (4, 'A', 'B', 5, 'C', 'garbage');",
        )
        .unwrap();

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM reviews ORDER BY id", REVIEW_COLUMNS))
            .unwrap();
        let reviews: Vec<Review> = stmt
            .query_map([], Review::from_row)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(reviews[0].created_at.to_iso8601(), "2025-01-31T09:30:00Z");
        assert_eq!(reviews[1].created_at, ReviewTimestamp::Raw(String::new()));
        assert_eq!(reviews[2].created_at.to_iso8601(), "2025-01-31T09:30:00Z");
        assert_eq!(reviews[3].created_at, ReviewTimestamp::Raw("garbage".into()));
    }
}
