//! SubmissionCoordinator end to end against the SQLite stores, plus
//! failure injection through fake collaborators

mod helpers;

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use edeposit_rest::db::{SqliteArtifactCache, SqliteStatusTracker};
use edeposit_rest::error::ValidationKind;
use edeposit_rest::models::{
    CachedArtifact, CanonicalMetadata, StatusRecord, SubmissionState, TrackingId, TRACKING_ID_FIELD,
};
use edeposit_rest::services::{SubmissionCoordinator, Upload};
use edeposit_rest::storage::{ArtifactCache, FileStream, StatusTracker};
use edeposit_rest::{DepositError, DepositResult};
use helpers::{complete_metadata, scenario_metadata, stream_of, BrokenReader, TestEnv};

struct Fixture {
    env: TestEnv,
    cache: Arc<SqliteArtifactCache>,
    tracker: Arc<SqliteStatusTracker>,
    coordinator: SubmissionCoordinator,
}

async fn fixture() -> Fixture {
    let env = TestEnv::new().await;
    let cache = Arc::new(SqliteArtifactCache::new(env.pool.clone(), env.artifacts_dir.clone()));
    let tracker = Arc::new(SqliteStatusTracker::new(env.pool.clone()));
    let coordinator = SubmissionCoordinator::new(cache.clone(), tracker.clone());
    Fixture {
        env,
        cache,
        tracker,
        coordinator,
    }
}

fn upload(filename: Option<&str>, bytes: &[u8]) -> Option<Upload<'static>> {
    Some(Upload::new(filename.map(str::to_string), stream_of(bytes)))
}

#[tokio::test]
async fn test_scenario_a_accepted_and_registered() {
    let f = fixture().await;

    let id = f
        .coordinator
        .submit("alice", &scenario_metadata().to_string(), upload(Some("kniha.pdf"), b"obsah"))
        .await
        .unwrap();

    assert_eq!(id.to_string().len(), 36);

    let record = f.tracker.get_status(&id, "alice").await.unwrap();
    assert_eq!(record.state, SubmissionState::Registered);

    let artifact = f.cache.get(&id).await.unwrap().unwrap();
    assert_eq!(artifact.filename, "kniha.pdf");
    assert_eq!(artifact.metadata[TRACKING_ID_FIELD], id.to_string());
    assert_eq!(artifact.metadata["libraries_that_can_access"], json!(["NKC"]));

    assert_eq!(f.env.count("cached_artifacts").await, 1);
    assert_eq!(f.env.count("status_records").await, 1);
}

#[tokio::test]
async fn test_metadata_filename_wins_over_upload_name() {
    let f = fixture().await;

    let id = f
        .coordinator
        .submit("alice", &complete_metadata().to_string(), upload(Some("upload.bin"), b"x"))
        .await
        .unwrap();

    assert_eq!(f.cache.get(&id).await.unwrap().unwrap().filename, "kniha.pdf");
}

#[tokio::test]
async fn test_scenario_b_invalid_year_creates_nothing() {
    let f = fixture().await;
    let mut metadata = complete_metadata();
    metadata["rok_vydani"] = json!("azgabash");

    let err = f
        .coordinator
        .submit("alice", &metadata.to_string(), upload(Some("kniha.pdf"), b"obsah"))
        .await
        .unwrap_err();

    match err {
        DepositError::Validation(v) => {
            assert_eq!(v.kind, ValidationKind::Schema);
            assert!(v.mentions("rok_vydani"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }

    assert_eq!(f.env.count("cached_artifacts").await, 0);
    assert_eq!(f.env.count("status_records").await, 0);
    assert!(f.env.artifact_files().is_empty());
}

#[tokio::test]
async fn test_scenario_c_numeric_year_matches_string_form() {
    let f = fixture().await;
    let mut numeric = complete_metadata();
    numeric["rok_vydani"] = json!(1989);

    let from_string = f
        .coordinator
        .submit("alice", &complete_metadata().to_string(), upload(None, b"a"))
        .await
        .unwrap();
    let from_number = f
        .coordinator
        .submit("alice", &numeric.to_string(), upload(None, b"a"))
        .await
        .unwrap();

    let mut a = f.cache.get(&from_string).await.unwrap().unwrap().metadata;
    let mut b = f.cache.get(&from_number).await.unwrap().unwrap().metadata;
    a.as_object_mut().unwrap().remove(TRACKING_ID_FIELD);
    b.as_object_mut().unwrap().remove(TRACKING_ID_FIELD);
    assert_eq!(a, b);
    assert_eq!(a["datumVydani"], "1989");
}

#[tokio::test]
async fn test_missing_upload() {
    let f = fixture().await;

    let err = f
        .coordinator
        .submit("alice", &complete_metadata().to_string(), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DepositError::Validation(ref v) if v.kind == ValidationKind::MissingUpload
    ));
    assert_eq!(f.env.count("status_records").await, 0);
}

#[tokio::test]
async fn test_validation_precedes_upload_check() {
    let f = fixture().await;

    let err = f
        .coordinator
        .submit("alice", &scenario_metadata().to_string(), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DepositError::Validation(ref v) if v.kind == ValidationKind::MissingField
    ));
}

#[tokio::test]
async fn test_malformed_metadata() {
    let f = fixture().await;

    for raw in ["", "{", "\"kniha\"", "[]"] {
        let err = f
            .coordinator
            .submit("alice", raw, upload(Some("kniha.pdf"), b"x"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, DepositError::Validation(ref v) if v.kind == ValidationKind::MalformedInput),
            "{:?} gave {:?}",
            raw,
            err
        );
    }
}

#[tokio::test]
async fn test_interrupted_upload_creates_nothing() {
    let f = fixture().await;

    let err = f
        .coordinator
        .submit(
            "alice",
            &complete_metadata().to_string(),
            Some(Upload::new(None, BrokenReader::stream(b"zacatek"))),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DepositError::Storage(_)));
    assert_eq!(f.env.count("cached_artifacts").await, 0);
    assert_eq!(f.env.count("status_records").await, 0);
    assert!(f.env.artifact_files().is_empty());
}

// Fake collaborators for failure injection

struct FailingTracker;

#[async_trait]
impl StatusTracker for FailingTracker {
    async fn register(&self, _: &TrackingId, _: &str) -> DepositResult<StatusRecord> {
        Err(DepositError::Storage("disk full".to_string()))
    }

    async fn get_status(&self, id: &TrackingId, _: &str) -> DepositResult<StatusRecord> {
        Err(DepositError::NotFound(id.to_string()))
    }

    async fn list_statuses(&self, _: &str) -> DepositResult<Vec<StatusRecord>> {
        Ok(Vec::new())
    }

    async fn advance(
        &self,
        id: &TrackingId,
        _: SubmissionState,
        _: Option<&str>,
    ) -> DepositResult<StatusRecord> {
        Err(DepositError::NotFound(id.to_string()))
    }
}

struct CollidingCache;

#[async_trait]
impl ArtifactCache for CollidingCache {
    async fn put(
        &self,
        id: &TrackingId,
        _: &str,
        _: &CanonicalMetadata,
        _: FileStream<'_>,
    ) -> DepositResult<CachedArtifact> {
        Err(DepositError::Conflict(id.to_string()))
    }

    async fn get(&self, _: &TrackingId) -> DepositResult<Option<CachedArtifact>> {
        Ok(None)
    }

    async fn list_pending(&self) -> DepositResult<Vec<CachedArtifact>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_registration_failure_reports_orphaned_artifact() {
    let f = fixture().await;
    let coordinator = SubmissionCoordinator::new(f.cache.clone(), Arc::new(FailingTracker));

    let err = coordinator
        .submit("alice", &complete_metadata().to_string(), upload(None, b"obsah"))
        .await
        .unwrap_err();

    let tracking_id = match err {
        DepositError::OrphanedArtifact { tracking_id, reason } => {
            assert!(reason.contains("disk full"));
            tracking_id
        }
        other => panic!("expected orphaned artifact, got {:?}", other),
    };

    // The cache write is not rolled back
    let id: TrackingId = tracking_id.parse().unwrap();
    assert!(f.cache.get(&id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_cache_conflict_skips_registration() {
    let f = fixture().await;
    let coordinator = SubmissionCoordinator::new(Arc::new(CollidingCache), f.tracker.clone());

    let err = coordinator
        .submit("alice", &complete_metadata().to_string(), upload(None, b"obsah"))
        .await
        .unwrap_err();

    assert!(matches!(err, DepositError::Conflict(_)));
    assert_eq!(f.env.count("status_records").await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions() {
    let f = fixture().await;

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let coordinator = f.coordinator.clone();
            tokio::spawn(async move {
                let user = if i % 2 == 0 { "alice" } else { "bob" };
                coordinator
                    .submit(user, &complete_metadata().to_string(), upload(None, b"obsah"))
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(f.tracker.list_statuses("alice").await.unwrap().len(), 8);
    assert_eq!(f.tracker.list_statuses("bob").await.unwrap().len(), 8);
    assert_eq!(f.env.count("cached_artifacts").await, 16);
}
