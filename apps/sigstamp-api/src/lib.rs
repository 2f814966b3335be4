//! Signing API server
//!
//! Provides REST endpoints for:
//! - Health checks
//! - Original PDF delivery
//! - Signature stamping with an audit trail
//! - Audit log lookup
//! - Static delivery of signed PDFs

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod source;
pub mod state;
pub mod store;

pub use config::Config;
pub use state::AppState;

/// Build the router over shared state
pub fn app(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let signed = ServeDir::new(&state.signed_dir);

    Router::new()
        // Health check
        .route("/api/health", get(handlers::health))
        // Original documents
        .route("/api/pdfs/:pdf_id", get(handlers::get_pdf))
        // Signing
        .route("/api/sign-pdf", post(handlers::sign_pdf))
        // Audit trail
        .route("/api/audit/:id", get(handlers::get_audit))
        // Signed output
        .nest_service("/signed", signed)
        // Add middleware
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
