//! User directory on SQLite

use async_trait::async_trait;
use edeposit_common::api::{generate_salt, hash_password, verify_password};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use super::is_unique_violation;
use crate::error::{DepositError, DepositResult, ValidationError};
use crate::storage::UserDirectory;

pub struct SqliteUserDirectory {
    pool: SqlitePool,
}

impl SqliteUserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn is_valid_user(&self, username: &str, password: &str) -> DepositResult<bool> {
        let row = sqlx::query("SELECT password_hash, password_salt FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            debug!(username = %username, "Unknown user");
            return Ok(false);
        };

        let hash: String = row.get("password_hash");
        let salt: String = row.get("password_salt");
        Ok(verify_password(password, &salt, &hash))
    }

    async fn add_user(&self, username: &str, password: &str) -> DepositResult<()> {
        if username.is_empty() || username.contains(':') {
            return Err(ValidationError::malformed_input(
                "uživatelské jméno nesmí být prázdné ani obsahovat ':'",
            )
            .into());
        }

        let salt = generate_salt();
        let hash = hash_password(password, &salt);

        sqlx::query(
            "INSERT INTO users (username, password_hash, password_salt, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(&hash)
        .bind(&salt)
        .bind(edeposit_common::time::to_db_string(&edeposit_common::time::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DepositError::Conflict(format!("user {}", username))
            } else {
                DepositError::from(e)
            }
        })?;

        info!(username = %username, "User added");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edeposit_common::db::init_in_memory_database;

    async fn directory() -> SqliteUserDirectory {
        SqliteUserDirectory::new(init_in_memory_database().await.unwrap())
    }

    #[tokio::test]
    async fn test_valid_and_invalid_credentials() {
        let users = directory().await;
        users.add_user("alice", "tajne").await.unwrap();

        assert!(users.is_valid_user("alice", "tajne").await.unwrap());
        assert!(!users.is_valid_user("alice", "spatne").await.unwrap());
        assert!(!users.is_valid_user("bob", "tajne").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_user_rejected() {
        let users = directory().await;
        users.add_user("alice", "a").await.unwrap();

        let err = users.add_user("alice", "b").await.unwrap_err();
        assert!(matches!(err, DepositError::Conflict(_)));
        assert!(users.is_valid_user("alice", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_salts_differ_per_user() {
        let users = directory().await;
        users.add_user("alice", "same").await.unwrap();
        users.add_user("bob", "same").await.unwrap();

        let hashes: Vec<String> = sqlx::query_scalar("SELECT password_hash FROM users ORDER BY username")
            .fetch_all(&users.pool)
            .await
            .unwrap();
        assert_ne!(hashes[0], hashes[1]);
    }

    #[tokio::test]
    async fn test_username_with_colon_rejected() {
        let users = directory().await;
        assert!(users.add_user("a:b", "x").await.is_err());
    }
}
