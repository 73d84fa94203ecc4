//! Status tracker on SQLite
//!
//! `status_records` holds the current state per deposit; the full history
//! lives in the append-only `status_transitions` table. Rows are inserted
//! and the current state column moves forward, nothing is ever deleted.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{error, info, warn};

use super::{is_unique_violation, parse_timestamp};
use crate::error::{DepositError, DepositResult};
use crate::models::{StateTransition, StatusRecord, SubmissionState, TrackingId};
use crate::storage::StatusTracker;

pub struct SqliteStatusTracker {
    pool: SqlitePool,
}

impl SqliteStatusTracker {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Load a record regardless of owner
///
/// Run on a transaction connection so the state row and the history come
/// from the same snapshot.
async fn load_record(
    conn: &mut SqliteConnection,
    tracking_id: &TrackingId,
) -> DepositResult<Option<StatusRecord>> {
    let row = sqlx::query(
        "SELECT tracking_id, username, state, created_at FROM status_records WHERE tracking_id = ?",
    )
    .bind(tracking_id.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some(record_from_row(conn, &row).await?)),
        None => Ok(None),
    }
}

async fn record_from_row(conn: &mut SqliteConnection, row: &SqliteRow) -> DepositResult<StatusRecord> {
    let tracking_id: String = row.get("tracking_id");
    let tracking_id: TrackingId = tracking_id.parse().map_err(|e| {
        DepositError::Storage(format!("Corrupt tracking_id '{}': {}", tracking_id, e))
    })?;

    let state: String = row.get("state");
    let created_at: String = row.get("created_at");

    Ok(StatusRecord {
        tracking_id,
        username: row.get("username"),
        state: parse_state(&state)?,
        created_at: parse_timestamp("created_at", &created_at)?,
        history: load_history(conn, &tracking_id).await?,
    })
}

async fn load_history(
    conn: &mut SqliteConnection,
    tracking_id: &TrackingId,
) -> DepositResult<Vec<StateTransition>> {
    let rows = sqlx::query(
        r#"
        SELECT from_state, to_state, note, transitioned_at
        FROM status_transitions
        WHERE tracking_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(tracking_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| {
            let from: Option<String> = row.get("from_state");
            let to: String = row.get("to_state");
            let at: String = row.get("transitioned_at");

            Ok(StateTransition {
                from: from.as_deref().map(parse_state).transpose()?,
                to: parse_state(&to)?,
                note: row.get("note"),
                at: parse_timestamp("transitioned_at", &at)?,
            })
        })
        .collect()
}

fn parse_state(value: &str) -> DepositResult<SubmissionState> {
    value.parse().map_err(DepositError::Storage)
}

#[async_trait]
impl StatusTracker for SqliteStatusTracker {
    async fn register(
        &self,
        tracking_id: &TrackingId,
        username: &str,
    ) -> DepositResult<StatusRecord> {
        let now = edeposit_common::time::now();
        let at = edeposit_common::time::to_db_string(&now);
        let id = tracking_id.to_string();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO status_records (tracking_id, username, state, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(username)
        .bind(SubmissionState::Registered.as_str())
        .bind(&at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                error!(tracking_id = %tracking_id, "Status record already exists");
                DepositError::Conflict(id.clone())
            } else {
                DepositError::from(e)
            }
        })?;

        let history = vec![
            StateTransition {
                from: None,
                to: SubmissionState::Received,
                note: None,
                at: now,
            },
            StateTransition {
                from: Some(SubmissionState::Received),
                to: SubmissionState::Registered,
                note: None,
                at: now,
            },
        ];

        for transition in &history {
            sqlx::query(
                r#"
                INSERT INTO status_transitions (tracking_id, from_state, to_state, note, transitioned_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(transition.from.map(|s| s.as_str()))
            .bind(transition.to.as_str())
            .bind(transition.note.as_deref())
            .bind(&at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(tracking_id = %tracking_id, username = %username, "Deposit registered");

        // Round-trip through the persisted form so callers see stored precision
        let now = parse_timestamp("created_at", &at)?;
        Ok(StatusRecord {
            tracking_id: *tracking_id,
            username: username.to_string(),
            state: SubmissionState::Registered,
            created_at: now,
            history: history
                .into_iter()
                .map(|t| StateTransition { at: now, ..t })
                .collect(),
        })
    }

    async fn get_status(
        &self,
        tracking_id: &TrackingId,
        username: &str,
    ) -> DepositResult<StatusRecord> {
        let mut tx = self.pool.begin().await?;
        let record = load_record(&mut tx, tracking_id).await?;
        tx.commit().await?;
        let record = record.ok_or_else(|| DepositError::NotFound(tracking_id.to_string()))?;

        if record.username != username {
            warn!(
                tracking_id = %tracking_id,
                username = %username,
                "Status query for a deposit owned by another user"
            );
            return Err(DepositError::Forbidden {
                tracking_id: tracking_id.to_string(),
                username: username.to_string(),
            });
        }

        Ok(record)
    }

    async fn list_statuses(&self, username: &str) -> DepositResult<Vec<StatusRecord>> {
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query(
            r#"
            SELECT tracking_id, username, state, created_at
            FROM status_records
            WHERE username = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(username)
        .fetch_all(&mut *tx)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(record_from_row(&mut tx, row).await?);
        }
        tx.commit().await?;
        Ok(records)
    }

    async fn advance(
        &self,
        tracking_id: &TrackingId,
        next: SubmissionState,
        note: Option<&str>,
    ) -> DepositResult<StatusRecord> {
        let id = tracking_id.to_string();
        let mut tx = self.pool.begin().await?;

        // Write first so the transaction holds the lock before it reads;
        // concurrent advances then serialize instead of racing snapshots
        let locked = sqlx::query("UPDATE status_records SET state = state WHERE tracking_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        if locked.rows_affected() == 0 {
            return Err(DepositError::NotFound(id.clone()));
        }

        let current: String =
            sqlx::query_scalar("SELECT state FROM status_records WHERE tracking_id = ?")
                .bind(&id)
                .fetch_one(&mut *tx)
                .await?;
        let current = parse_state(&current)?;

        let invalid = || DepositError::InvalidTransition {
            tracking_id: id.clone(),
            from: current,
            to: next,
        };

        if !current.can_transition_to(next) {
            return Err(invalid());
        }

        // Compare-and-set on the state just read
        let updated = sqlx::query(
            "UPDATE status_records SET state = ? WHERE tracking_id = ? AND state = ?",
        )
        .bind(next.as_str())
        .bind(&id)
        .bind(current.as_str())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(invalid());
        }

        let at = edeposit_common::time::to_db_string(&edeposit_common::time::now());
        sqlx::query(
            r#"
            INSERT INTO status_transitions (tracking_id, from_state, to_state, note, transitioned_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(current.as_str())
        .bind(next.as_str())
        .bind(note)
        .bind(&at)
        .execute(&mut *tx)
        .await?;

        let record = load_record(&mut tx, tracking_id).await?;
        tx.commit().await?;

        info!(tracking_id = %tracking_id, from = %current, to = %next, "Deposit status advanced");

        record.ok_or_else(|| DepositError::NotFound(id.clone()))
    }
}
