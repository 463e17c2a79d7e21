//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `parley-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, and a single
//! transaction per message exchange.

use parley_core::chat::repository::ChatRepository;
use parley_types::chat::{ChatMessage, ChatSession, MessageRole};
use parley_types::error::RepositoryError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain ChatSession.
struct ChatSessionRow {
    id: String,
    user_id: Option<String>,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;
        let user_id = self
            .user_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?;
        let created_at = parse_datetime(&self.created_at)?;
        let updated_at = parse_datetime(&self.updated_at)?;

        Ok(ChatSession {
            id,
            user_id,
            title: self.title,
            created_at,
            updated_at,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain ChatMessage.
struct ChatMessageRow {
    id: String,
    session_id: String,
    role: String,
    content: String,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let session_id = Uuid::parse_str(&self.session_id)
            .map_err(|e| RepositoryError::Query(format!("invalid session_id: {e}")))?;
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(ChatMessage {
            id,
            session_id,
            role,
            content: self.content,
            created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(super) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

pub(super) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_sessions (id, user_id, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.user_id.map(|id| id.to_string()))
        .bind(&session.title)
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(session.clone())
    }

    async fn get_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn list_sessions_for_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_sessions WHERE user_id = ? ORDER BY updated_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row = ChatSessionRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            sessions.push(session_row.into_session()?);
        }

        Ok(sessions)
    }

    async fn list_sessions_for_token(
        &self,
        token: &str,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT s.* FROM chat_sessions s
               JOIN anonymous_session_links l ON l.session_id = s.id
               WHERE l.session_token = ?
               ORDER BY s.updated_at DESC"#,
        )
        .bind(token)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row = ChatSessionRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            sessions.push(session_row.into_session()?);
        }

        Ok(sessions)
    }

    async fn link_session_token(
        &self,
        token: &str,
        session_id: &Uuid,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO anonymous_session_links (session_token, session_id, created_at)
               VALUES (?, ?, ?)"#,
        )
        .bind(token)
        .bind(session_id.to_string())
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn append_exchange(
        &self,
        user_message: &ChatMessage,
        assistant_message: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        for message in [user_message, assistant_message] {
            sqlx::query(
                r#"INSERT INTO messages (id, session_id, role, content, created_at)
                   VALUES (?, ?, ?, ?, ?)"#,
            )
            .bind(message.id.to_string())
            .bind(message.session_id.to_string())
            .bind(message.role.to_string())
            .bind(&message.content)
            .bind(format_datetime(&message.created_at))
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        let result = sqlx::query("UPDATE chat_sessions SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&user_message.created_at))
            .bind(user_message.session_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            // Dropping tx rolls back both inserts.
            return Err(RepositoryError::NotFound);
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_messages(&self, session_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        // id is UUID v7 (creation-ordered), so it breaks ties when two
        // messages share a timestamp.
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE session_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row = ChatMessageRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(msg_row.into_message()?);
        }

        Ok(messages)
    }

    async fn count_messages(&self, session_id: &Uuid) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM messages WHERE session_id = ?")
            .bind(session_id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::DatabasePool;
    use chrono::Duration;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn make_session(user_id: Option<Uuid>) -> ChatSession {
        let now = Utc::now();
        ChatSession {
            id: Uuid::now_v7(),
            user_id,
            title: "New Chat".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn make_message(session_id: Uuid, role: MessageRole, content: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::now_v7(),
            session_id,
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    async fn seed_user(pool: &DatabasePool) -> Uuid {
        let user_id = Uuid::now_v7();
        sqlx::query("INSERT INTO users (id, email, created_at) VALUES (?, ?, ?)")
            .bind(user_id.to_string())
            .bind(Some("test@example.com"))
            .bind(Utc::now().to_rfc3339())
            .execute(&pool.writer)
            .await
            .unwrap();
        user_id
    }

    async fn seed_quota(pool: &DatabasePool, token: &str) {
        sqlx::query(
            "INSERT INTO anonymous_sessions (id, session_token, message_count, created_at, last_activity) VALUES (?, ?, 0, ?, ?)",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(token)
        .bind(Utc::now().to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&pool.writer)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());

        let user_id = seed_user(&pool).await;
        let session = make_session(Some(user_id));
        let created = repo.create_session(&session).await.unwrap();
        assert_eq!(created.id, session.id);

        let found = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(found.id, session.id);
        assert_eq!(found.user_id, Some(user_id));
        assert_eq!(found.title, "New Chat");
    }

    #[tokio::test]
    async fn test_get_session_missing_is_none() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let found = repo.get_session(&Uuid::now_v7()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_anonymous_session_round_trips_null_owner() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let session = make_session(None);
        repo.create_session(&session).await.unwrap();

        let found = repo.get_session(&session.id).await.unwrap().unwrap();
        assert!(found.user_id.is_none());
    }

    #[tokio::test]
    async fn test_list_sessions_for_user_recency_order() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());

        let user_id = seed_user(&pool).await;
        let base = Utc::now();
        for offset in [0, 60, 30] {
            let mut session = make_session(Some(user_id));
            session.updated_at = base + Duration::seconds(offset);
            repo.create_session(&session).await.unwrap();
        }

        let sessions = repo.list_sessions_for_user(&user_id).await.unwrap();
        assert_eq!(sessions.len(), 3);
        for pair in sessions.windows(2) {
            assert!(pair[0].updated_at >= pair[1].updated_at);
        }
    }

    #[tokio::test]
    async fn test_list_sessions_for_token_scoped_by_link() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool.clone());

        seed_quota(&pool, "t1").await;
        seed_quota(&pool, "t2").await;

        let mine = make_session(None);
        repo.create_session(&mine).await.unwrap();
        repo.link_session_token("t1", &mine.id).await.unwrap();

        let other = make_session(None);
        repo.create_session(&other).await.unwrap();
        repo.link_session_token("t2", &other.id).await.unwrap();

        let sessions = repo.list_sessions_for_token("t1").await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, mine.id);
    }

    #[tokio::test]
    async fn test_append_exchange_writes_pair_and_touches_session() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let session = make_session(None);
        repo.create_session(&session).await.unwrap();

        let sent_at = Utc::now() + Duration::seconds(5);
        let mut user_msg = make_message(session.id, MessageRole::User, "Hello");
        user_msg.created_at = sent_at;
        let mut assistant_msg = make_message(session.id, MessageRole::Assistant, "Hi there!");
        assistant_msg.created_at = sent_at + Duration::seconds(1);

        repo.append_exchange(&user_msg, &assistant_msg).await.unwrap();

        let messages = repo.get_messages(&session.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert!(messages[0].created_at <= messages[1].created_at);

        let touched = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(touched.updated_at, user_msg.created_at);
    }

    #[tokio::test]
    async fn test_append_exchange_unknown_session_writes_nothing() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let ghost = Uuid::now_v7();
        let user_msg = make_message(ghost, MessageRole::User, "Hello");
        let assistant_msg = make_message(ghost, MessageRole::Assistant, "Hi");

        let err = repo.append_exchange(&user_msg, &assistant_msg).await;
        assert!(err.is_err());

        let count = repo.count_messages(&ghost).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_get_messages_chronological() {
        let pool = test_pool().await;
        let repo = SqliteChatRepository::new(pool);

        let session = make_session(None);
        repo.create_session(&session).await.unwrap();

        let base = Utc::now();
        for (i, content) in ["first", "second", "third"].iter().enumerate() {
            let mut user_msg = make_message(session.id, MessageRole::User, content);
            user_msg.created_at = base + Duration::seconds(i as i64 * 10);
            let mut assistant_msg =
                make_message(session.id, MessageRole::Assistant, &format!("re: {content}"));
            assistant_msg.created_at = user_msg.created_at + Duration::seconds(1);
            repo.append_exchange(&user_msg, &assistant_msg).await.unwrap();
        }

        let messages = repo.get_messages(&session.id).await.unwrap();
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0].content, "first");
        for pair in messages.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }

        assert_eq!(repo.count_messages(&session.id).await.unwrap(), 6);
    }
}
