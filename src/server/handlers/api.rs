//! JSON handlers: the review feed and the health check
//!
//! Store failures are logged here with full detail; the response body only
//! carries a generic message.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::error;

use crate::review::Review;
use crate::server::{run_blocking, ServerState};

/// Body of `GET /api/reviews`
#[derive(Debug, Serialize)]
pub struct ReviewFeed {
    pub reviews: Vec<Review>,
    pub count: usize,
}

/// Error body for JSON endpoints
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: &'static str,
    pub message: &'static str,
}

/// Body of `GET /health`
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum HealthReport {
    Healthy {
        status: &'static str,
        database: &'static str,
        reviews_count: u64,
        timestamp: f64,
    },
    Unhealthy {
        status: &'static str,
        database: &'static str,
        error: &'static str,
    },
}

/// `GET /api/reviews`
pub async fn api_reviews(State(state): State<ServerState>) -> Response {
    match run_blocking(&state, |db| db.reviews().list_all()).await {
        Ok(reviews) => Json(ReviewFeed {
            count: reviews.len(),
            reviews,
        })
        .into_response(),
        Err(e) => {
            error!("API error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError {
                    error: "Database error",
                    message: "Unable to load reviews. Please try again later.",
                }),
            )
                .into_response()
        }
    }
}

/// `GET /health`
pub async fn health(State(state): State<ServerState>) -> Response {
    match run_blocking(&state, |db| db.reviews().count()).await {
        Ok(count) => Json(HealthReport::Healthy {
            status: "healthy",
            database: "connected",
            reviews_count: count,
            timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
        })
        .into_response(),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthReport::Unhealthy {
                    status: "error",
                    database: "disconnected",
                    error: "Review store unavailable",
                }),
            )
                .into_response()
        }
    }
}
