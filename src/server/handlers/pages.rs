//! HTML page handlers

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;
use tracing::{error, info};

use crate::review::{validate, ReviewCandidate};
use crate::server::html::{AddReviewPage, HtmlTemplate, NotFoundPage, Notice, ReviewsPage};
use crate::server::{run_blocking, ServerState};

const SUBMITTED_MESSAGE: &str = "Review submitted successfully!";

/// Query string of `GET /reviews`
#[derive(Debug, Default, Deserialize)]
pub struct ReviewsQuery {
    #[serde(default)]
    pub submitted: Option<String>,
}

/// `GET /`
pub async fn index() -> Redirect {
    Redirect::to("/reviews")
}

/// `GET /reviews`
pub async fn list_reviews(
    State(state): State<ServerState>,
    Query(query): Query<ReviewsQuery>,
) -> Response {
    let mut notices = Vec::new();
    if query.submitted.is_some() {
        notices.push(Notice::success(SUBMITTED_MESSAGE));
    }

    match run_blocking(&state, |db| db.reviews().list_all()).await {
        Ok(reviews) => HtmlTemplate(ReviewsPage::new(&reviews, notices)).into_response(),
        Err(e) => {
            error!("Error loading reviews: {}", e);
            notices.push(Notice::error("Error loading reviews. Please try again."));
            HtmlTemplate(ReviewsPage::new(&[], notices))
                .with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// `GET /addreview`
pub async fn add_review_form() -> HtmlTemplate<AddReviewPage> {
    HtmlTemplate(AddReviewPage::new(&ReviewCandidate::default(), Vec::new()))
}

/// `POST /addreview`
pub async fn submit_review(
    State(state): State<ServerState>,
    Form(candidate): Form<ReviewCandidate>,
) -> Response {
    let review = match validate(&candidate) {
        Ok(review) => review,
        Err(e) => {
            let notices = e.violations().iter().map(Notice::violation).collect();
            return HtmlTemplate(AddReviewPage::new(&candidate, notices))
                .with_status(StatusCode::UNPROCESSABLE_ENTITY);
        }
    };

    let school_name = review.school_name().to_string();
    match run_blocking(&state, move |db| db.reviews().insert(&review)).await {
        Ok(id) => {
            info!("Review {} submitted for {}", id, school_name);
            Redirect::to("/reviews?submitted=1").into_response()
        }
        Err(e) => {
            error!("Error adding review: {}", e);
            let notices = vec![Notice::error("Error submitting review. Please try again.")];
            HtmlTemplate(AddReviewPage::new(&candidate, notices))
                .with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Fallback for paths without a route
pub async fn not_found() -> Response {
    HtmlTemplate(NotFoundPage::default()).with_status(StatusCode::NOT_FOUND)
}
