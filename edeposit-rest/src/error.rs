//! Error types for edeposit-rest
//!
//! Every failure of the submission and status pipeline maps to exactly one
//! HTTP status code. Validation errors carry a Czech, end-user facing
//! message that enumerates every problem found, not just the first one.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::models::SubmissionState;

/// Which validation rule rejected the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationKind {
    /// Required `nazev_souboru` absent or empty
    MissingField,
    /// No file part accompanied the metadata
    MissingUpload,
    /// Metadata is not a JSON object, or the multipart body is unusable
    MalformedInput,
    /// Metadata violates the publication schema
    Schema,
}

/// A single offending key, named by its client-facing field name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldProblem {
    pub field: String,
    pub reason: String,
}

/// Client-fixable rejection of a submission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub kind: ValidationKind,
    pub message: String,
    pub problems: Vec<FieldProblem>,
}

impl ValidationError {
    pub fn missing_field(field: &str) -> Self {
        Self {
            kind: ValidationKind::MissingField,
            message: format!("Parametr `{}` je povinný!", field),
            problems: vec![FieldProblem {
                field: field.to_string(),
                reason: "povinný údaj chybí".to_string(),
            }],
        }
    }

    pub fn missing_upload() -> Self {
        Self {
            kind: ValidationKind::MissingUpload,
            message: "Tělo requestu musí obsahovat ohlašovaný soubor!".to_string(),
            problems: Vec::new(),
        }
    }

    pub fn malformed_input(detail: impl std::fmt::Display) -> Self {
        Self {
            kind: ValidationKind::MalformedInput,
            message: format!("Neplatný formát požadavku: {}", detail),
            problems: Vec::new(),
        }
    }

    /// Build a schema error from every missing and invalid key
    pub fn schema(missing: Vec<String>, invalid: Vec<FieldProblem>) -> Self {
        let mut parts = Vec::new();
        if !missing.is_empty() {
            parts.push(format!("Chybějící klíče: {}", missing.join(", ")));
        }
        if !invalid.is_empty() {
            let rendered: Vec<String> = invalid
                .iter()
                .map(|p| format!("{} ({})", p.field, p.reason))
                .collect();
            parts.push(format!("Neplatné hodnoty: {}", rendered.join(", ")));
        }

        let mut problems: Vec<FieldProblem> = missing
            .into_iter()
            .map(|field| FieldProblem {
                field,
                reason: "povinný údaj chybí".to_string(),
            })
            .collect();
        problems.extend(invalid);

        Self {
            kind: ValidationKind::Schema,
            message: parts.join("; "),
            problems,
        }
    }

    /// Whether `field` is among the reported problems
    pub fn mentions(&self, field: &str) -> bool {
        self.problems.iter().any(|p| p.field == field)
    }
}

/// Pipeline error type
#[derive(Debug, Error)]
pub enum DepositError {
    /// Client-fixable input problem (400)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Request body exceeded the configured upload limit (413)
    #[error("Upload exceeds the allowed size")]
    PayloadTooLarge,

    /// No status record for the identifier (404)
    #[error("Tracking identifier not found: {0}")]
    NotFound(String),

    /// Record exists but belongs to another user (403)
    #[error("User {username} may not access {tracking_id}")]
    Forbidden {
        tracking_id: String,
        username: String,
    },

    /// Identifier already present in a store (500, integrity anomaly)
    #[error("Tracking identifier already exists: {0}")]
    Conflict(String),

    /// Persistence failed (500)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Downstream collaborator attempted an illegal state change (500)
    #[error("Invalid status transition for {tracking_id}: {from} -> {to}")]
    InvalidTransition {
        tracking_id: String,
        from: SubmissionState,
        to: SubmissionState,
    },

    /// Artifact cached but no status record registered (500, needs operator)
    #[error("Artifact {tracking_id} is cached but status registration failed: {reason}")]
    OrphanedArtifact { tracking_id: String, reason: String },
}

impl From<sqlx::Error> for DepositError {
    fn from(err: sqlx::Error) -> Self {
        DepositError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for DepositError {
    fn from(err: std::io::Error) -> Self {
        DepositError::Storage(err.to_string())
    }
}

impl From<edeposit_common::Error> for DepositError {
    fn from(err: edeposit_common::Error) -> Self {
        DepositError::Storage(err.to_string())
    }
}

impl IntoResponse for DepositError {
    fn into_response(self) -> Response {
        match self {
            DepositError::Validation(validation) => validation_response(validation),
            other => failure_response(other),
        }
    }
}

fn validation_response(validation: ValidationError) -> Response {
    let code = match validation.kind {
        ValidationKind::MissingField => "MISSING_FIELD",
        ValidationKind::MissingUpload => "MISSING_UPLOAD",
        ValidationKind::MalformedInput => "MALFORMED_INPUT",
        ValidationKind::Schema => "VALIDATION_ERROR",
    };

    let body = Json(json!({
        "error": {
            "code": code,
            "message": validation.message,
            "problems": validation.problems,
        }
    }));

    (StatusCode::BAD_REQUEST, body).into_response()
}

fn failure_response(err: DepositError) -> Response {
    let (status, error_code) = match &err {
        DepositError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        DepositError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
        DepositError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        DepositError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        DepositError::Conflict(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFLICT"),
        DepositError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        DepositError::InvalidTransition { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_TRANSITION")
        }
        DepositError::OrphanedArtifact { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "ORPHANED_ARTIFACT")
        }
    };

    if status.is_server_error() {
        error!(code = error_code, error = %err, "Request failed");
    }

    let body = Json(json!({
        "error": {
            "code": error_code,
            "message": err.to_string(),
        }
    }));

    (status, body).into_response()
}

/// Result type for pipeline operations and API handlers
pub type DepositResult<T> = Result<T, DepositError>;
