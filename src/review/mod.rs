//! Review entity, validation, and projection
//!
//! - `validate`: acceptance rules turning a [`ReviewCandidate`] into a [`NewReview`]
//! - `record`: the persisted [`Review`] and its row/JSON/display projections

mod record;
mod validate;

pub use record::{Review, ReviewDisplay, ReviewId, ReviewTimestamp, REVIEW_COLUMNS};
pub use validate::{
    validate, NewReview, ReviewCandidate, ReviewField, ValidationError, Violation, MAX_RATING,
    MIN_RATING,
};
