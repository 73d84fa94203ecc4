//! Deposit submission endpoint
//!
//! POST /api/v1/submit, multipart with a JSON metadata field and one file.
//!
//! A file part that follows the metadata is streamed straight into the
//! artifact cache. A file part sent first has to be buffered until the
//! metadata arrives.

use axum::{
    extract::{multipart::Field, multipart::MultipartError, multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use futures::StreamExt;
use std::io::{self, Cursor};
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

use super::auth::AuthenticatedUser;
use crate::error::{DepositError, DepositResult, ValidationError};
use crate::models::TrackingId;
use crate::services::Upload;
use crate::storage::UploadTooLarge;
use crate::AppState;

/// Multipart field carrying the metadata document
pub const METADATA_FIELD: &str = "json_metadata";

/// Accepted alias of [`METADATA_FIELD`]
pub const METADATA_FIELD_ALIAS: &str = "json_data";

/// Multipart field carrying the file when it has no filename
pub const FILE_FIELD: &str = "file";

pub async fn submit_publication(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> DepositResult<Response> {
    let mut multipart =
        multipart.map_err(|rejection| ValidationError::malformed_input(rejection.body_text()))?;

    let mut raw_metadata: Option<String> = None;
    let mut upload: Option<Upload> = None;

    while let Some(field) = multipart.next_field().await.map_err(structural_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == METADATA_FIELD || name == METADATA_FIELD_ALIAS {
            if raw_metadata.is_some() {
                debug!(field = %name, "Ignoring repeated metadata field");
                continue;
            }
            raw_metadata = Some(field.text().await.map_err(structural_error)?);
        } else if upload.is_none() && (field.file_name().is_some() || name == FILE_FIELD) {
            let filename = field.file_name().map(str::to_string);

            if let Some(raw_metadata) = raw_metadata.as_deref() {
                debug!(filename = ?filename, "Streaming file part");
                let stream = StreamReader::new(field.map(|chunk| chunk.map_err(upload_io_error)));
                let tracking_id = state
                    .coordinator
                    .submit(
                        user.username(),
                        raw_metadata,
                        Some(Upload::new(filename, Box::pin(stream))),
                    )
                    .await?;
                return Ok(accepted(&tracking_id));
            }

            let bytes = read_file_field(field).await?;
            debug!(filename = ?filename, size_bytes = bytes.len(), "Received file part");
            upload = Some(Upload::new(filename, Box::pin(Cursor::new(bytes))));
        } else {
            debug!(field = %name, "Ignoring multipart field");
        }
    }

    let raw_metadata = raw_metadata.ok_or_else(|| {
        ValidationError::malformed_input(format!("chybí pole `{}`", METADATA_FIELD))
    })?;

    let tracking_id = state
        .coordinator
        .submit(user.username(), &raw_metadata, upload)
        .await?;

    Ok(accepted(&tracking_id))
}

fn accepted(tracking_id: &TrackingId) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        tracking_id.to_string(),
    )
        .into_response()
}

/// Read the whole file part while the metadata is still outstanding
///
/// Failure mid-stream means the client went away or the body limit was hit;
/// neither is a validation problem.
async fn read_file_field(mut field: Field<'_>) -> DepositResult<Vec<u8>> {
    let mut bytes = Vec::new();
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => bytes.extend_from_slice(&chunk),
            Ok(None) => return Ok(bytes),
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(DepositError::PayloadTooLarge)
            }
            Err(e) => {
                warn!(error = %e, "Upload interrupted");
                return Err(DepositError::Storage(format!(
                    "Upload stream failed: {}",
                    e.body_text()
                )));
            }
        }
    }
}

/// Failure while the cache is pulling a streamed file part
fn upload_io_error(err: MultipartError) -> io::Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        io::Error::new(io::ErrorKind::Other, UploadTooLarge)
    } else {
        warn!(error = %err, "Upload interrupted");
        io::Error::new(io::ErrorKind::Other, err.body_text())
    }
}

fn structural_error(err: MultipartError) -> DepositError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DepositError::PayloadTooLarge
    } else {
        ValidationError::malformed_input(err.body_text()).into()
    }
}
