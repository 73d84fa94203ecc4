//! Static reference structures
//!
//! Public, read-only lookup tables clients use to fill in
//! `category_for_riv` and `libraries_that_can_access`.

use axum::{routing::get, Json, Router};
use std::collections::BTreeMap;

use crate::reference;
use crate::AppState;

/// GET /api/v1/structures/riv
pub async fn riv_structure() -> Json<BTreeMap<&'static str, &'static str>> {
    Json(reference::riv_map())
}

/// GET /api/v1/structures/library_map
pub async fn library_map_structure() -> Json<BTreeMap<&'static str, &'static str>> {
    Json(reference::library_map())
}

pub fn structure_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/structures/riv", get(riv_structure))
        .route("/api/v1/structures/library_map", get(library_map_structure))
}
