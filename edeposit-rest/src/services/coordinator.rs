//! Submission coordinator
//!
//! Drives one deposit through parse, normalize, issue, cache and register.
//! The cache write always precedes status registration; a registration
//! failure after a successful cache write is not rolled back but reported
//! as an orphaned artifact for operator reconciliation.

use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{issuer, normalizer};
use crate::error::{DepositError, DepositResult, ValidationError};
use crate::models::{TrackingId, FILENAME_FIELD};
use crate::storage::{ArtifactCache, FileStream, StatusTracker};

/// File part of a submission
pub struct Upload<'a> {
    /// Name the client attached to the file part, if any
    pub filename: Option<String>,
    pub stream: FileStream<'a>,
}

impl<'a> Upload<'a> {
    pub fn new(filename: Option<String>, stream: FileStream<'a>) -> Self {
        Self { filename, stream }
    }
}

#[derive(Clone)]
pub struct SubmissionCoordinator {
    cache: Arc<dyn ArtifactCache>,
    tracker: Arc<dyn StatusTracker>,
}

impl SubmissionCoordinator {
    pub fn new(cache: Arc<dyn ArtifactCache>, tracker: Arc<dyn StatusTracker>) -> Self {
        Self { cache, tracker }
    }

    /// Accept one deposit and return its tracking identifier
    pub async fn submit(
        &self,
        username: &str,
        raw_metadata: &str,
        upload: Option<Upload<'_>>,
    ) -> DepositResult<TrackingId> {
        let mut raw = normalizer::parse_raw_metadata(raw_metadata)?;

        // The multipart filename stands in for a missing `nazev_souboru`
        if let Some(name) = upload.as_ref().and_then(|u| u.filename.as_deref()) {
            let absent = match raw.get(FILENAME_FIELD) {
                Some(Value::String(s)) => s.trim().is_empty(),
                _ => true,
            };
            if absent && !name.trim().is_empty() {
                raw.insert(FILENAME_FIELD.to_string(), Value::String(name.to_string()));
            }
        }

        let mut metadata = normalizer::normalize(raw).map_err(|e| {
            info!(username = %username, error = %e, "Submission rejected");
            e
        })?;

        let upload = upload.ok_or_else(|| {
            info!(username = %username, "Submission without file");
            ValidationError::missing_upload()
        })?;

        let tracking_id = issuer::issue();
        metadata.attach_tracking_id(&tracking_id);

        self.cache
            .put(&tracking_id, username, &metadata, upload.stream)
            .await
            .map_err(|e| {
                match &e {
                    DepositError::Conflict(_) => {
                        error!(tracking_id = %tracking_id, "Integrity anomaly: tracking identifier collision in artifact cache")
                    }
                    other => {
                        warn!(tracking_id = %tracking_id, error = %other, "Artifact cache write failed")
                    }
                }
                e
            })?;

        if let Err(e) = self.tracker.register(&tracking_id, username).await {
            error!(
                tracking_id = %tracking_id,
                username = %username,
                error = %e,
                "Orphaned artifact: cached but status registration failed, operator reconciliation required"
            );
            return Err(DepositError::OrphanedArtifact {
                tracking_id: tracking_id.to_string(),
                reason: e.to_string(),
            });
        }

        info!(
            tracking_id = %tracking_id,
            username = %username,
            filename = %metadata.filename(),
            "Deposit accepted"
        );

        Ok(tracking_id)
    }
}
