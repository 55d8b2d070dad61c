//! HTML pages for browsing and submitting reviews
//!
//! Pages are askama templates under `templates/`; every value is HTML-escaped
//! on render. [`HtmlTemplate`] turns a page into an axum response.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::review::{Review, ReviewCandidate, Violation, MAX_RATING, MIN_RATING};

/// Kind of banner shown above page content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A one-off message shown at the top of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    /// Form field the message is about, if any
    pub field: Option<&'static str>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
            field: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
            field: None,
        }
    }

    pub fn violation(violation: &Violation) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: violation.to_string(),
            field: Some(violation.field_name()),
        }
    }

    fn class(&self) -> &'static str {
        match self.kind {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        }
    }

    fn field_name(&self) -> &'static str {
        self.field.unwrap_or_default()
    }
}

/// Wrapper to render askama templates as axum responses
pub struct HtmlTemplate<T>(pub T);

impl<T: Template> HtmlTemplate<T> {
    /// Render with the given status; a render failure becomes a bare 500.
    pub fn with_status(self, status: StatusCode) -> Response {
        match self.0.render() {
            Ok(rendered) => (status, Html(rendered)).into_response(),
            Err(err) => {
                tracing::error!(error = %err, "Template render failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        self.with_status(StatusCode::OK)
    }
}

/// A review as shown in the list
struct ReviewItem {
    school_name: String,
    reviewer_name: String,
    rating: u8,
    stars: String,
    comment: String,
    iso: String,
    date: String,
    date_short: String,
    relative: String,
}

impl From<&Review> for ReviewItem {
    fn from(review: &Review) -> Self {
        let display = review.display();
        Self {
            school_name: review.school_name.clone(),
            reviewer_name: review.reviewer_name.clone(),
            rating: review.rating,
            stars: display.stars(),
            comment: review.comment.clone(),
            iso: review.created_at.to_iso8601(),
            date: display.date(),
            date_short: display.date_short(),
            relative: display.relative().unwrap_or_default(),
        }
    }
}

/// Page listing all reviews, newest first
#[derive(Template)]
#[template(path = "reviews.html")]
pub struct ReviewsPage {
    title: &'static str,
    notices: Vec<Notice>,
    reviews: Vec<ReviewItem>,
}

impl ReviewsPage {
    pub fn new(reviews: &[Review], notices: Vec<Notice>) -> Self {
        Self {
            title: "School Reviews",
            notices,
            reviews: reviews.iter().map(ReviewItem::from).collect(),
        }
    }
}

struct RatingOption {
    value: u8,
    selected: bool,
}

/// Review submission form, pre-filled with earlier input
#[derive(Template)]
#[template(path = "add_review.html")]
pub struct AddReviewPage {
    title: &'static str,
    notices: Vec<Notice>,
    school_name: String,
    reviewer_name: String,
    rating_options: Vec<RatingOption>,
    comment: String,
}

impl AddReviewPage {
    pub fn new(candidate: &ReviewCandidate, notices: Vec<Notice>) -> Self {
        let chosen = candidate.rating.trim();
        let rating_options = (MIN_RATING..=MAX_RATING)
            .rev()
            .map(|value| RatingOption {
                value,
                selected: chosen == value.to_string(),
            })
            .collect();

        Self {
            title: "Add a Review",
            notices,
            school_name: candidate.school_name.clone(),
            reviewer_name: candidate.reviewer_name.clone(),
            rating_options,
            comment: candidate.comment.clone(),
        }
    }
}

/// Shown for any path without a route
#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundPage {
    title: &'static str,
    notices: Vec<Notice>,
}

impl Default for NotFoundPage {
    fn default() -> Self {
        Self {
            title: "Page not found",
            notices: Vec::new(),
        }
    }
}
