//! Shared fixtures for edeposit-rest integration tests

#![allow(dead_code)]

use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};
use tempfile::TempDir;
use tokio::io::{AsyncRead, ReadBuf};

use edeposit_rest::storage::{FileStream, UploadTooLarge};

/// Database and artifact directory under a temporary root folder
pub struct TestEnv {
    pub dir: TempDir,
    pub pool: SqlitePool,
    pub artifacts_dir: PathBuf,
}

impl TestEnv {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let pool = edeposit_common::db::init_database(&dir.path().join("edeposit.db"))
            .await
            .unwrap();
        let artifacts_dir = dir.path().join("artifacts");

        Self {
            dir,
            pool,
            artifacts_dir,
        }
    }

    /// Files currently present in the artifacts directory
    pub fn artifact_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.artifacts_dir) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

/// Metadata accepted by the normalizer without the filename
pub fn scenario_metadata() -> Value {
    json!({
        "title": "Název",
        "poradi_vydani": "3",
        "misto_vydani": "Praha",
        "rok_vydani": "1989",
        "zpracovatel_zaznamu": "/me",
    })
}

/// Same as [`scenario_metadata`] with `nazev_souboru` set
pub fn complete_metadata() -> Value {
    let mut metadata = scenario_metadata();
    metadata["nazev_souboru"] = json!("kniha.pdf");
    metadata
}

pub fn stream_of(bytes: &[u8]) -> FileStream<'static> {
    Box::pin(io::Cursor::new(bytes.to_vec()))
}

/// Yields `prefix`, then fails like a dropped connection
pub struct BrokenReader {
    prefix: Vec<u8>,
    sent: bool,
    failure: fn() -> io::Error,
}

impl BrokenReader {
    pub fn stream(prefix: &[u8]) -> FileStream<'static> {
        Self::failing_with(prefix, || {
            io::Error::new(io::ErrorKind::ConnectionReset, "client disconnected")
        })
    }

    /// Fails the way a request cut off by the body limit does
    pub fn over_limit(prefix: &[u8]) -> FileStream<'static> {
        Self::failing_with(prefix, || io::Error::new(io::ErrorKind::Other, UploadTooLarge))
    }

    fn failing_with(prefix: &[u8], failure: fn() -> io::Error) -> FileStream<'static> {
        Box::pin(Self {
            prefix: prefix.to_vec(),
            sent: false,
            failure,
        })
    }
}

impl AsyncRead for BrokenReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if !self.sent {
            self.sent = true;
            let n = self.prefix.len().min(buf.remaining());
            buf.put_slice(&self.prefix[..n]);
            return Poll::Ready(Ok(()));
        }
        Poll::Ready(Err((self.failure)()))
    }
}
