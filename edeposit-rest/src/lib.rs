//! edeposit-rest library - e-deposit submission and status service
//!
//! Accepts digital-publication deposits over authenticated HTTP, normalizes
//! their metadata, caches the file for downstream processing and tracks
//! each deposit's status.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod reference;
pub mod services;
pub mod storage;

pub use crate::error::{DepositError, DepositResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::db::{SqliteArtifactCache, SqliteStatusTracker, SqliteUserDirectory};
use crate::services::SubmissionCoordinator;
use crate::storage::{ArtifactCache, StatusTracker, UserDirectory};

/// Application state shared across HTTP handlers
///
/// Built once in `main` and injected; there is no global state.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: SubmissionCoordinator,
    pub tracker: Arc<dyn StatusTracker>,
    pub users: Arc<dyn UserDirectory>,
    /// Request body limit for the submit route
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        cache: Arc<dyn ArtifactCache>,
        tracker: Arc<dyn StatusTracker>,
        users: Arc<dyn UserDirectory>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            coordinator: SubmissionCoordinator::new(cache, tracker.clone()),
            tracker,
            users,
            max_upload_bytes,
        }
    }

    /// Wire the SQLite-backed stores onto one pool
    pub fn from_pool(pool: SqlitePool, artifacts_dir: PathBuf, max_upload_bytes: usize) -> Self {
        Self::new(
            Arc::new(SqliteArtifactCache::new(pool.clone(), artifacts_dir)),
            Arc::new(SqliteStatusTracker::new(pool.clone())),
            Arc::new(SqliteUserDirectory::new(pool)),
            max_upload_bytes,
        )
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (Basic auth)
    let protected = Router::new()
        .route(
            "/api/v1/submit",
            post(api::submit_publication).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .route("/api/v1/track", get(api::track_publications))
        .route("/api/v1/track/:id", get(api::track_publication))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::basic_auth_middleware,
        ));

    // Public routes
    let public = Router::new()
        .merge(api::structure_routes())
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
