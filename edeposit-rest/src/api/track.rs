//! Status queries
//!
//! Callers only ever see records they own.

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::auth::AuthenticatedUser;
use crate::error::{DepositError, DepositResult};
use crate::models::{StatusRecord, TrackingId};
use crate::AppState;

/// GET /api/v1/track/:id
pub async fn track_publication(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> DepositResult<Json<StatusRecord>> {
    // Nothing can be stored under an identifier that does not parse
    let tracking_id: TrackingId = id.parse().map_err(|_| DepositError::NotFound(id.clone()))?;

    let record = state
        .tracker
        .get_status(&tracking_id, user.username())
        .await?;

    Ok(Json(record))
}

/// GET /api/v1/track
pub async fn track_publications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> DepositResult<Json<Vec<StatusRecord>>> {
    let records = state.tracker.list_statuses(user.username()).await?;
    Ok(Json(records))
}
