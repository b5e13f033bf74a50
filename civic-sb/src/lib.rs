//! civic-sb library - suggestion box service
//!
//! Exposes the router and application state so integration tests can drive
//! the service without binding a socket.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod pagination;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use civic_common::config::UploadConfig;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::{BlobStore, IdentityProvider, SuggestionLifecycle};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Suggestion store and lifecycle rules
    pub suggestions: SuggestionLifecycle,
    /// Bearer token verification
    pub identity: Arc<dyn IdentityProvider>,
    /// Limits applied to submission uploads
    pub uploads: UploadConfig,
    /// Directory served read-only at `/uploads`
    pub uploads_dir: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        identity: Arc<dyn IdentityProvider>,
        blobs: Arc<dyn BlobStore>,
        uploads: UploadConfig,
        uploads_dir: PathBuf,
    ) -> Self {
        Self {
            suggestions: SuggestionLifecycle::new(db.clone(), blobs, uploads),
            db,
            identity,
            uploads,
            uploads_dir,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Every request passes the identity middleware first: a supplied bearer
/// token must verify, an absent one leaves the request anonymous. Role
/// checks are layered on the staff and admin route groups.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    Router::new()
        .merge(api::health_routes())
        .merge(api::suggestion_routes(&state))
        .merge(api::public_routes())
        .merge(api::admin_suggestion_routes())
        .merge(api::admin_department_routes())
        .nest_service("/uploads", ServeDir::new(&state.uploads_dir))
        .layer(middleware::from_fn_with_state(state.clone(), api::identify))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
