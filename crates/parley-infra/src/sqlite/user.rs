//! SQLite user repository implementation.
//!
//! Users are written out of band (seeding scripts, tests); the RPC surface
//! never creates them.

use parley_core::user::repository::UserRepository;
use parley_types::error::RepositoryError;
use parley_types::user::User;
use sqlx::Row;
use uuid::Uuid;

use super::chat::{format_datetime, parse_datetime};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &User) -> Result<User, RepositoryError> {
        sqlx::query("INSERT INTO users (id, email, created_at) VALUES (?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.email)
            .bind(format_datetime(&user.created_at))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(user.clone())
    }

    async fn get(&self, user_id: &Uuid) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let id: String = row
                    .try_get("id")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                let email: Option<String> = row
                    .try_get("email")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                let created_at: String = row
                    .try_get("created_at")
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;

                Ok(Some(User {
                    id: Uuid::parse_str(&id)
                        .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?,
                    email,
                    created_at: parse_datetime(&created_at)?,
                }))
            }
            None => Ok(None),
        }
    }
}
