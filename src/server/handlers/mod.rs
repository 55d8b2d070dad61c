//! Route handlers
//!
//! - `pages`: HTML review list and submission form
//! - `api`: JSON review feed and health check

pub mod api;
pub mod pages;

pub use api::{api_reviews, health, ApiError, HealthReport, ReviewFeed};
pub use pages::{add_review_form, index, list_reviews, not_found, submit_review, ReviewsQuery};
