//! HTTP server module
//!
//! This module provides the web front end of the review store: HTML pages for
//! browsing and submitting reviews, a read-only JSON feed, and a health check.
//!
//! # Routes
//!
//! | Method | Path           | Handler                              |
//! |--------|----------------|--------------------------------------|
//! | GET    | `/`            | redirect to `/reviews`               |
//! | GET    | `/reviews`     | HTML list, newest first              |
//! | GET    | `/addreview`   | HTML submission form                 |
//! | POST   | `/addreview`   | validate, store, redirect            |
//! | GET    | `/api/reviews` | `{"reviews": [...], "count": n}`     |
//! | GET    | `/health`      | store reachability and review count  |
//! | any    | anything else  | "Page not found" page, status 404    |
//!
//! The review store API is blocking; handlers move every store call onto
//! tokio's blocking pool with [`run_blocking`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use school_reviews::server::{start_server, ServerConfig};
//!
//! let db = Arc::new(ReviewDatabase::from_config(&config));
//! db.ensure_schema()?;
//! start_server(db, ServerConfig::from(&config)).await?;
//! ```

pub mod handlers;
pub mod html;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ReviewsConfig;
use crate::database::{ReviewDatabase, StorageError};

// =============================================================================
// Server Configuration
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub address: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl From<&ReviewsConfig> for ServerConfig {
    fn from(config: &ReviewsConfig) -> Self {
        Self {
            address: config.address.clone(),
            port: config.port,
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Get the full bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

// =============================================================================
// Server State
// =============================================================================

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    /// Review store shared by all handlers
    pub db: Arc<ReviewDatabase>,
}

/// Run a blocking store operation on tokio's blocking pool.
///
/// A panicked or cancelled task is reported as an unknown storage error.
pub async fn run_blocking<T, F>(state: &ServerState, f: F) -> Result<T, StorageError>
where
    F: FnOnce(&ReviewDatabase) -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    let db = Arc::clone(&state.db);
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .unwrap_or_else(|e| Err(StorageError::Unknown(format!("store task failed: {}", e))))
}

// =============================================================================
// Router Creation
// =============================================================================

/// Create the Axum router with all routes registered
pub fn create_router(db: Arc<ReviewDatabase>) -> Router {
    use handlers::*;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/reviews", get(list_reviews))
        .route("/addreview", get(add_review_form).post(submit_review))
        .route("/api/reviews", get(api_reviews))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ServerState { db })
}

// =============================================================================
// Server Startup
// =============================================================================

/// Start the HTTP server
///
/// The schema must already be ensured; this only binds and serves.
pub async fn start_server(db: Arc<ReviewDatabase>, config: ServerConfig) -> anyhow::Result<()> {
    let app = create_router(db);

    let bind_address = config.bind_address();
    tracing::info!("Starting HTTP server on http://{}", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
