//! SQLite quota repository implementation.
//!
//! The consume path is a single conditional UPDATE so the quota ceiling
//! holds under concurrent sends (no check-then-act window).

use parley_core::quota::repository::QuotaRepository;
use parley_types::error::RepositoryError;
use parley_types::quota::AnonymousQuota;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::chat::{format_datetime, parse_datetime};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `QuotaRepository`.
pub struct SqliteQuotaRepository {
    pool: DatabasePool,
}

impl SqliteQuotaRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain AnonymousQuota.
struct AnonymousQuotaRow {
    id: String,
    session_token: String,
    message_count: i64,
    created_at: String,
    last_activity: String,
}

impl AnonymousQuotaRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_token: row.try_get("session_token")?,
            message_count: row.try_get("message_count")?,
            created_at: row.try_get("created_at")?,
            last_activity: row.try_get("last_activity")?,
        })
    }

    fn into_quota(self) -> Result<AnonymousQuota, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid quota id: {e}")))?;
        let created_at = parse_datetime(&self.created_at)?;
        let last_activity = parse_datetime(&self.last_activity)?;

        Ok(AnonymousQuota {
            id,
            session_token: self.session_token,
            message_count: self.message_count as u32,
            created_at,
            last_activity,
        })
    }
}

impl QuotaRepository for SqliteQuotaRepository {
    async fn get_by_token(&self, token: &str) -> Result<Option<AnonymousQuota>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM anonymous_sessions WHERE session_token = ?")
            .bind(token)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let quota_row = AnonymousQuotaRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(quota_row.into_quota()?))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, quota: &AnonymousQuota) -> Result<AnonymousQuota, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO anonymous_sessions (id, session_token, message_count, created_at, last_activity)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(quota.id.to_string())
        .bind(&quota.session_token)
        .bind(quota.message_count as i64)
        .bind(format_datetime(&quota.created_at))
        .bind(format_datetime(&quota.last_activity))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!(
                    "token '{}' already registered",
                    quota.session_token
                ))
            }
            _ => RepositoryError::Query(e.to_string()),
        })?;

        Ok(quota.clone())
    }

    async fn touch_activity(&self, token: &str, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE anonymous_sessions SET last_activity = ? WHERE session_token = ?")
                .bind(format_datetime(&at))
                .bind(token)
                .execute(&self.pool.writer)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn try_consume(
        &self,
        token: &str,
        limit: u32,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE anonymous_sessions
               SET message_count = message_count + 1, last_activity = ?
               WHERE session_token = ? AND message_count < ?"#,
        )
        .bind(format_datetime(&at))
        .bind(token)
        .bind(limit as i64)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}
