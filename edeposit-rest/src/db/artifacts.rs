//! Artifact cache on disk plus SQLite
//!
//! Write protocol: stream the upload into `<artifacts>/<id>-<nonce>.part`
//! while hashing it, rename to `.bin`, then insert the `cached_artifacts`
//! row. The row is the commit point; a file without a row is never read.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{is_unique_violation, parse_timestamp};
use crate::error::{DepositError, DepositResult};
use crate::models::{CachedArtifact, CanonicalMetadata, TrackingId};
use crate::storage::{self, ArtifactCache, FileStream};

const CHUNK_SIZE: usize = 64 * 1024;

pub struct SqliteArtifactCache {
    pool: SqlitePool,
    artifacts_dir: PathBuf,
}

impl SqliteArtifactCache {
    pub fn new(pool: SqlitePool, artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            artifacts_dir: artifacts_dir.into(),
        }
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    async fn exists(&self, tracking_id: &TrackingId) -> DepositResult<bool> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT tracking_id FROM cached_artifacts WHERE tracking_id = ?")
                .bind(tracking_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    /// Copy `file` into `part_path`, returning (size, sha256 hex)
    async fn write_part(&self, mut file: FileStream<'_>, part_path: &Path) -> DepositResult<(u64, String)> {
        let mut out = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(part_path)
            .await?;

        let mut hasher = Sha256::new();
        let mut size: u64 = 0;
        let mut buf = vec![0u8; CHUNK_SIZE];

        loop {
            let read = file.read(&mut buf).await.map_err(storage::read_error)?;
            if read == 0 {
                break;
            }
            hasher.update(&buf[..read]);
            out.write_all(&buf[..read]).await?;
            size += read as u64;
        }

        out.flush().await?;
        out.sync_all().await?;

        Ok((size, format!("{:x}", hasher.finalize())))
    }

    async fn insert_row(&self, artifact: &CachedArtifact) -> DepositResult<()> {
        let metadata = serde_json::to_string(&artifact.metadata)
            .map_err(|e| DepositError::Storage(format!("Failed to serialize metadata: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO cached_artifacts (
                tracking_id, username, filename, metadata,
                file_path, size_bytes, sha256, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(artifact.tracking_id.to_string())
        .bind(&artifact.username)
        .bind(&artifact.filename)
        .bind(metadata)
        .bind(artifact.file_path.to_string_lossy().into_owned())
        .bind(artifact.size_bytes as i64)
        .bind(&artifact.sha256)
        .bind(edeposit_common::time::to_db_string(&artifact.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DepositError::Conflict(artifact.tracking_id.to_string())
            } else {
                DepositError::from(e)
            }
        })?;

        Ok(())
    }
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove abandoned artifact file");
        }
    }
}

fn artifact_from_row(row: &SqliteRow) -> DepositResult<CachedArtifact> {
    let tracking_id: String = row.get("tracking_id");
    let tracking_id: TrackingId = tracking_id
        .parse()
        .map_err(|e| DepositError::Storage(format!("Corrupt tracking_id '{}': {}", tracking_id, e)))?;

    let metadata: String = row.get("metadata");
    let metadata = serde_json::from_str(&metadata)
        .map_err(|e| DepositError::Storage(format!("Corrupt metadata for {}: {}", tracking_id, e)))?;

    let file_path: String = row.get("file_path");
    let size_bytes: i64 = row.get("size_bytes");
    let created_at: String = row.get("created_at");

    Ok(CachedArtifact {
        tracking_id,
        username: row.get("username"),
        filename: row.get("filename"),
        metadata,
        file_path: PathBuf::from(file_path),
        size_bytes: size_bytes.max(0) as u64,
        sha256: row.get("sha256"),
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

#[async_trait]
impl ArtifactCache for SqliteArtifactCache {
    async fn put(
        &self,
        tracking_id: &TrackingId,
        username: &str,
        metadata: &CanonicalMetadata,
        file: FileStream<'_>,
    ) -> DepositResult<CachedArtifact> {
        if self.exists(tracking_id).await? {
            error!(tracking_id = %tracking_id, "Tracking identifier already cached");
            return Err(DepositError::Conflict(tracking_id.to_string()));
        }

        tokio::fs::create_dir_all(&self.artifacts_dir).await?;

        let stem = format!("{}-{}", tracking_id, Uuid::new_v4().simple());
        let part_path = self.artifacts_dir.join(format!("{}.part", stem));
        let final_path = self.artifacts_dir.join(format!("{}.bin", stem));

        let (size_bytes, sha256) = match self.write_part(file, &part_path).await {
            Ok(written) => written,
            Err(e) => {
                discard(&part_path).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&part_path, &final_path).await {
            discard(&part_path).await;
            return Err(e.into());
        }

        let artifact = CachedArtifact {
            tracking_id: *tracking_id,
            username: username.to_string(),
            filename: metadata.filename().to_string(),
            metadata: metadata.to_json(),
            file_path: final_path,
            size_bytes,
            sha256,
            created_at: edeposit_common::time::now(),
        };

        if let Err(e) = self.insert_row(&artifact).await {
            discard(&artifact.file_path).await;
            return Err(e);
        }

        info!(
            tracking_id = %tracking_id,
            username = %username,
            size_bytes,
            "Artifact cached"
        );
        debug!(path = %artifact.file_path.display(), sha256 = %artifact.sha256, "Artifact file");

        Ok(artifact)
    }

    async fn get(&self, tracking_id: &TrackingId) -> DepositResult<Option<CachedArtifact>> {
        let row = sqlx::query(
            r#"
            SELECT tracking_id, username, filename, metadata,
                   file_path, size_bytes, sha256, created_at
            FROM cached_artifacts
            WHERE tracking_id = ?
            "#,
        )
        .bind(tracking_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(artifact_from_row).transpose()
    }

    async fn list_pending(&self) -> DepositResult<Vec<CachedArtifact>> {
        let rows = sqlx::query(
            r#"
            SELECT tracking_id, username, filename, metadata,
                   file_path, size_bytes, sha256, created_at
            FROM cached_artifacts
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(artifact_from_row).collect()
    }
}
