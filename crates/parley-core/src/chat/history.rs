//! History and listing service: read-only queries with access control.

use uuid::Uuid;

use parley_types::chat::{ChatMessage, ChatSession};
use parley_types::error::ChatError;

use crate::chat::repository::ChatRepository;
use crate::quota::repository::QuotaRepository;

/// Read-only queries over sessions and messages.
pub struct HistoryService<C: ChatRepository, Q: QuotaRepository> {
    chat_repo: C,
    quota_repo: Q,
}

impl<C: ChatRepository, Q: QuotaRepository> HistoryService<C, Q> {
    /// Create a new history service with the given repositories.
    pub fn new(chat_repo: C, quota_repo: Q) -> Self {
        Self {
            chat_repo,
            quota_repo,
        }
    }

    /// Fetch a session's messages, ordered by creation time ascending.
    ///
    /// Owned sessions require the matching user id. Anonymous sessions
    /// require a token with a registered quota record; any registered token
    /// is accepted -- the token is not bound to the specific session.
    pub async fn get_history(
        &self,
        session_id: Uuid,
        user_id: Option<Uuid>,
        token: Option<&str>,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let session = self
            .chat_repo
            .get_session(&session_id)
            .await?
            .ok_or(ChatError::SessionNotFound)?;

        match session.user_id {
            Some(owner) => {
                if user_id != Some(owner) {
                    return Err(ChatError::AccessDenied);
                }
            }
            None => {
                let token = token.ok_or(ChatError::TokenRequired)?;
                if self.quota_repo.get_by_token(token).await?.is_none() {
                    return Err(ChatError::InvalidToken);
                }
            }
        }

        Ok(self.chat_repo.get_messages(&session_id).await?)
    }

    /// List sessions for a user or an anonymous token, most recently
    /// updated first.
    ///
    /// With only a token, the result is scoped to sessions linked to that
    /// token when they were created. With neither, the list is empty.
    pub async fn list_sessions(
        &self,
        user_id: Option<Uuid>,
        token: Option<&str>,
    ) -> Result<Vec<ChatSession>, ChatError> {
        if let Some(user_id) = user_id {
            return Ok(self.chat_repo.list_sessions_for_user(&user_id).await?);
        }
        if let Some(token) = token {
            return Ok(self.chat_repo.list_sessions_for_token(token).await?);
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::{InMemoryChatRepository, InMemoryQuotaRepository};
    use chrono::{Duration, Utc};
    use parley_types::chat::{ChatSession, MessageRole};

    type TestService = HistoryService<InMemoryChatRepository, InMemoryQuotaRepository>;

    fn service() -> TestService {
        HistoryService::new(
            InMemoryChatRepository::default(),
            InMemoryQuotaRepository::default(),
        )
    }

    async fn seed_session(svc: &TestService, user_id: Option<Uuid>) -> ChatSession {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::now_v7(),
            user_id,
            title: "New Chat".to_string(),
            created_at: now,
            updated_at: now,
        };
        svc.chat_repo.create_session(&session).await.unwrap();
        session
    }

    async fn seed_exchange(svc: &TestService, session_id: Uuid, content: &str) {
        let now = Utc::now();
        let user = ChatMessage {
            id: Uuid::now_v7(),
            session_id,
            role: MessageRole::User,
            content: content.to_string(),
            created_at: now,
        };
        let assistant = ChatMessage {
            id: Uuid::now_v7(),
            session_id,
            role: MessageRole::Assistant,
            content: format!("reply to {content}"),
            created_at: now + Duration::seconds(1),
        };
        svc.chat_repo.append_exchange(&user, &assistant).await.unwrap();
    }

    #[tokio::test]
    async fn test_history_unknown_session() {
        let svc = service();
        let err = svc
            .get_history(Uuid::now_v7(), None, Some("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::SessionNotFound));
    }

    #[tokio::test]
    async fn test_history_owner_mismatch_denied() {
        let svc = service();
        let owner = Uuid::now_v7();
        let session = seed_session(&svc, Some(owner)).await;

        let err = svc
            .get_history(session.id, Some(Uuid::now_v7()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::AccessDenied));

        let err = svc.get_history(session.id, None, None).await.unwrap_err();
        assert!(matches!(err, ChatError::AccessDenied));
    }

    #[tokio::test]
    async fn test_history_owner_match_ordered_ascending() {
        let svc = service();
        let owner = Uuid::now_v7();
        let session = seed_session(&svc, Some(owner)).await;
        seed_exchange(&svc, session.id, "first").await;
        seed_exchange(&svc, session.id, "second").await;

        let messages = svc
            .get_history(session.id, Some(owner), None)
            .await
            .unwrap();
        assert_eq!(messages.len(), 4);
        for pair in messages.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn test_history_anonymous_requires_token() {
        let svc = service();
        let session = seed_session(&svc, None).await;

        let err = svc.get_history(session.id, None, None).await.unwrap_err();
        assert!(matches!(err, ChatError::TokenRequired));
    }

    #[tokio::test]
    async fn test_history_anonymous_unregistered_token_invalid() {
        let svc = service();
        let session = seed_session(&svc, None).await;

        let err = svc
            .get_history(session.id, None, Some("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidToken));
    }

    #[tokio::test]
    async fn test_history_anonymous_any_registered_token_accepted() {
        let svc = service();
        let session = seed_session(&svc, None).await;
        seed_exchange(&svc, session.id, "hi").await;
        // Token registered but never linked to this session.
        svc.quota_repo.seed("other", 0).await;

        let messages = svc
            .get_history(session.id, None, Some("other"))
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn test_list_sessions_for_user_most_recent_first() {
        let svc = service();
        let owner = Uuid::now_v7();
        let older = seed_session(&svc, Some(owner)).await;
        let newer = seed_session(&svc, Some(owner)).await;
        // Advance the newer session's updated_at via an exchange.
        seed_exchange(&svc, newer.id, "bump").await;

        let sessions = svc.list_sessions(Some(owner), None).await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, newer.id);
        assert_eq!(sessions[1].id, older.id);
        assert!(sessions[0].updated_at >= sessions[1].updated_at);
    }

    #[tokio::test]
    async fn test_list_sessions_for_token_scoped_to_links() {
        let svc = service();
        let mine = seed_session(&svc, None).await;
        let _other = seed_session(&svc, None).await;
        svc.chat_repo
            .link_session_token("t1", &mine.id)
            .await
            .unwrap();

        let sessions = svc.list_sessions(None, Some("t1")).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, mine.id);
    }

    #[tokio::test]
    async fn test_list_sessions_neither_given_is_empty() {
        let svc = service();
        seed_session(&svc, None).await;

        let sessions = svc.list_sessions(None, None).await.unwrap();
        assert!(sessions.is_empty());
    }
}
