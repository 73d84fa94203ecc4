//! Storage collaborator interfaces
//!
//! The submission pipeline treats each store as a transactionally safe black
//! box: a call either fully succeeds or fully fails, and its effect is
//! visible atomically to later readers. SQLite-backed implementations live
//! in [`crate::db`].

use async_trait::async_trait;
use std::io;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::error::{DepositError, DepositResult};
use crate::models::{CachedArtifact, CanonicalMetadata, StatusRecord, SubmissionState, TrackingId};

/// Uploaded file payload, consumed exactly once
///
/// May borrow the request body it is read from.
pub type FileStream<'a> = Pin<Box<dyn AsyncRead + Send + 'a>>;

/// Carried inside an `io::Error` when the request body limit cuts an upload short
#[derive(Debug, Error)]
#[error("upload exceeds the request body limit")]
pub struct UploadTooLarge;

/// Classify a failure while reading a [`FileStream`]
pub fn read_error(err: io::Error) -> DepositError {
    if err.get_ref().is_some_and(|inner| inner.is::<UploadTooLarge>()) {
        DepositError::PayloadTooLarge
    } else {
        DepositError::Storage(format!("Upload stream failed: {}", err))
    }
}

/// Write-once store of submitted artifacts
#[async_trait]
pub trait ArtifactCache: Send + Sync {
    /// Store one artifact atomically
    ///
    /// Consumes `file` in full before returning. Fails with `Conflict` if
    /// `tracking_id` is already cached and with `Storage` on any write or
    /// read failure (`PayloadTooLarge` if the body limit cut it short); in
    /// every case nothing becomes visible.
    async fn put(
        &self,
        tracking_id: &TrackingId,
        username: &str,
        metadata: &CanonicalMetadata,
        file: FileStream<'_>,
    ) -> DepositResult<CachedArtifact>;

    async fn get(&self, tracking_id: &TrackingId) -> DepositResult<Option<CachedArtifact>>;

    /// Every cached artifact, oldest first
    async fn list_pending(&self) -> DepositResult<Vec<CachedArtifact>>;
}

/// Per-deposit status state machine
#[async_trait]
pub trait StatusTracker: Send + Sync {
    /// Create the record in `RECEIVED` and move it straight to `REGISTERED`
    async fn register(&self, tracking_id: &TrackingId, username: &str)
        -> DepositResult<StatusRecord>;

    /// Fetch one record on behalf of `username`
    ///
    /// `NotFound` if absent, `Forbidden` if owned by someone else.
    async fn get_status(
        &self,
        tracking_id: &TrackingId,
        username: &str,
    ) -> DepositResult<StatusRecord>;

    /// All records owned by `username`, newest first
    async fn list_statuses(&self, username: &str) -> DepositResult<Vec<StatusRecord>>;

    /// Append one transition, used by downstream processing
    async fn advance(
        &self,
        tracking_id: &TrackingId,
        next: SubmissionState,
        note: Option<&str>,
    ) -> DepositResult<StatusRecord>;
}

/// Credential store consulted by the auth middleware
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn is_valid_user(&self, username: &str, password: &str) -> DepositResult<bool>;

    async fn add_user(&self, username: &str, password: &str) -> DepositResult<()>;
}
