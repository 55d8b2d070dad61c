//! Server-side acceptance rules for submitted reviews
//!
//! [`validate`] checks every rule and reports all violations at once, in rule
//! order, so a form can show the user every problem in a single round trip.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lowest accepted rating
pub const MIN_RATING: u8 = 1;
/// Highest accepted rating
pub const MAX_RATING: u8 = 5;

/// Raw, unvalidated review input as submitted by a form or the CLI
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReviewCandidate {
    #[serde(default)]
    pub school_name: String,
    #[serde(default)]
    pub reviewer_name: String,
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub comment: String,
}

impl ReviewCandidate {
    pub fn new(
        school_name: impl Into<String>,
        reviewer_name: impl Into<String>,
        rating: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            school_name: school_name.into(),
            reviewer_name: reviewer_name.into(),
            rating: rating.into(),
            comment: comment.into(),
        }
    }
}

/// A validated review, ready to be inserted
///
/// Only [`validate`] constructs this type, so holding one means every
/// acceptance rule passed: text fields are trimmed and non-empty, and the
/// rating is within `MIN_RATING..=MAX_RATING`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    school_name: String,
    reviewer_name: String,
    rating: u8,
    comment: String,
}

impl NewReview {
    pub fn school_name(&self) -> &str {
        &self.school_name
    }

    pub fn reviewer_name(&self) -> &str {
        &self.reviewer_name
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }
}

/// Required text fields of a review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewField {
    SchoolName,
    ReviewerName,
    Comment,
}

impl ReviewField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewField::SchoolName => "school_name",
            ReviewField::ReviewerName => "reviewer_name",
            ReviewField::Comment => "comment",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ReviewField::SchoolName => "School name",
            ReviewField::ReviewerName => "Reviewer name",
            ReviewField::Comment => "Comment",
        }
    }
}

/// A single broken acceptance rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    MissingField(ReviewField),
    InvalidRating,
}

impl Violation {
    /// Form field the violation refers to
    pub fn field_name(&self) -> &'static str {
        match self {
            Violation::MissingField(field) => field.as_str(),
            Violation::InvalidRating => "rating",
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingField(field) => write!(f, "{} is required", field.label()),
            Violation::InvalidRating => write!(
                f,
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            ),
        }
    }
}

/// Rejected review input; always holds at least one violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid review: {}", messages(.violations).join("; "))]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Human-readable messages, one per violation
    pub fn messages(&self) -> Vec<String> {
        messages(&self.violations)
    }
}

fn messages(violations: &[Violation]) -> Vec<String> {
    violations.iter().map(|v| v.to_string()).collect()
}

/// Validate a candidate review.
pub fn validate(candidate: &ReviewCandidate) -> Result<NewReview, ValidationError> {
    let mut violations = Vec::new();

    let school_name = candidate.school_name.trim();
    if school_name.is_empty() {
        violations.push(Violation::MissingField(ReviewField::SchoolName));
    }

    let reviewer_name = candidate.reviewer_name.trim();
    if reviewer_name.is_empty() {
        violations.push(Violation::MissingField(ReviewField::ReviewerName));
    }

    let rating = parse_rating(&candidate.rating);
    if rating.is_none() {
        violations.push(Violation::InvalidRating);
    }

    let comment = candidate.comment.trim();
    if comment.is_empty() {
        violations.push(Violation::MissingField(ReviewField::Comment));
    }

    match rating {
        Some(rating) if violations.is_empty() => Ok(NewReview {
            school_name: school_name.to_string(),
            reviewer_name: reviewer_name.to_string(),
            rating,
            comment: comment.to_string(),
        }),
        _ => Err(ValidationError { violations }),
    }
}

fn parse_rating(raw: &str) -> Option<u8> {
    let value: i64 = raw.trim().parse().ok()?;
    u8::try_from(value)
        .ok()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
}
