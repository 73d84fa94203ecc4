//! Cached artifact as read back by downstream processing

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

use super::TrackingId;

/// One submitted deposit awaiting downstream pickup
#[derive(Debug, Clone, Serialize)]
pub struct CachedArtifact {
    pub tracking_id: TrackingId,
    pub username: String,
    /// Original file name (`nazev_souboru`)
    pub filename: String,
    /// Canonical metadata, including `rest_id`
    pub metadata: Value,
    pub file_path: PathBuf,
    pub size_bytes: u64,
    /// SHA-256 of the payload, hex encoded
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}
