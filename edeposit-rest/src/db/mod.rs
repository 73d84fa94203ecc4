//! SQLite-backed storage collaborators
//!
//! Tables are created by `edeposit_common::db::create_schema`; this module
//! only reads and writes them.

pub mod artifacts;
pub mod statuses;
pub mod users;

pub use artifacts::SqliteArtifactCache;
pub use statuses::SqliteStatusTracker;
pub use users::SqliteUserDirectory;

use chrono::{DateTime, Utc};

use crate::error::DepositError;

/// Whether a sqlx error is a PRIMARY KEY / UNIQUE constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Parse a stored timestamp column
pub(crate) fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, DepositError> {
    edeposit_common::time::from_db_string(value).map_err(|e| {
        DepositError::Storage(format!("Failed to parse {} '{}': {}", column, value, e))
    })
}
