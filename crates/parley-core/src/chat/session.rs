//! Session and quota service.
//!
//! Creates and looks up anonymous quota records and chat sessions, and
//! answers quota checks against the configured message limit.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use parley_types::chat::ChatSession;
use parley_types::config::GlobalConfig;
use parley_types::error::ChatError;
use parley_types::quota::{AnonymousQuota, QuotaStatus};

use crate::chat::repository::ChatRepository;
use crate::quota::repository::QuotaRepository;

/// Orchestrates anonymous quota registration and chat session creation.
///
/// Generic over `ChatRepository` and `QuotaRepository` to maintain clean
/// architecture (parley-core never depends on parley-infra).
pub struct SessionService<C: ChatRepository, Q: QuotaRepository> {
    chat_repo: C,
    quota_repo: Q,
    config: GlobalConfig,
}

impl<C: ChatRepository, Q: QuotaRepository> SessionService<C, Q> {
    /// Create a new session service with the given repositories.
    pub fn new(chat_repo: C, quota_repo: Q, config: GlobalConfig) -> Self {
        Self {
            chat_repo,
            quota_repo,
            config,
        }
    }

    /// Register a fresh anonymous session: generates an opaque token and
    /// persists a quota record with count 0.
    pub async fn create_anonymous_session(&self) -> Result<AnonymousQuota, ChatError> {
        let now = Utc::now();
        let quota = AnonymousQuota {
            id: Uuid::now_v7(),
            session_token: format!("anon_{}", Uuid::now_v7().simple()),
            message_count: 0,
            created_at: now,
            last_activity: now,
        };

        let quota = self.quota_repo.create(&quota).await?;
        info!(token = %quota.session_token, "Anonymous session registered");
        Ok(quota)
    }

    /// Check the message quota for a token.
    ///
    /// A token never seen before gets a quota record with count 0 as a side
    /// effect, so the first check returns the full remaining allowance.
    pub async fn check_quota(&self, token: &str) -> Result<QuotaStatus, ChatError> {
        let count = match self.quota_repo.get_by_token(token).await? {
            Some(quota) => quota.message_count,
            None => {
                let now = Utc::now();
                let quota = AnonymousQuota {
                    id: Uuid::now_v7(),
                    session_token: token.to_string(),
                    message_count: 0,
                    created_at: now,
                    last_activity: now,
                };
                self.quota_repo.create(&quota).await?;
                0
            }
        };

        Ok(QuotaStatus::from_count(count, self.config.message_limit))
    }

    /// Create a chat session for a user or an anonymous token.
    ///
    /// The title falls back to the configured default when absent or empty.
    /// For anonymous callers the quota record is created (count 0) or its
    /// last_activity refreshed -- the count is never touched here -- and the
    /// token-to-session link is recorded for scoped listing. A session with
    /// an owner skips quota bookkeeping entirely, token or not.
    pub async fn create_session(
        &self,
        user_id: Option<Uuid>,
        token: Option<&str>,
        title: Option<String>,
    ) -> Result<ChatSession, ChatError> {
        let now = Utc::now();
        let title = title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.config.default_session_title.clone());

        let session = ChatSession {
            id: Uuid::now_v7(),
            user_id,
            title,
            created_at: now,
            updated_at: now,
        };
        let session = self.chat_repo.create_session(&session).await?;

        if user_id.is_none() {
            if let Some(token) = token {
                match self.quota_repo.get_by_token(token).await? {
                    Some(_) => self.quota_repo.touch_activity(token, now).await?,
                    None => {
                        let quota = AnonymousQuota {
                            id: Uuid::now_v7(),
                            session_token: token.to_string(),
                            message_count: 0,
                            created_at: now,
                            last_activity: now,
                        };
                        self.quota_repo.create(&quota).await?;
                    }
                }
                self.chat_repo.link_session_token(token, &session.id).await?;
            }
        }

        info!(session_id = %session.id, anonymous = session.is_anonymous(), "Chat session created");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::{InMemoryChatRepository, InMemoryQuotaRepository};

    fn service() -> SessionService<InMemoryChatRepository, InMemoryQuotaRepository> {
        SessionService::new(
            InMemoryChatRepository::default(),
            InMemoryQuotaRepository::default(),
            GlobalConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_create_anonymous_session_persists_fresh_quota() {
        let svc = service();
        let quota = svc.create_anonymous_session().await.unwrap();

        assert!(quota.session_token.starts_with("anon_"));
        assert_eq!(quota.message_count, 0);

        let stored = svc
            .quota_repo
            .get_by_token(&quota.session_token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, quota.id);
    }

    #[tokio::test]
    async fn test_check_quota_unseen_token_registers_once() {
        let svc = service();
        let status = svc.check_quota("t1").await.unwrap();

        assert!(status.can_send);
        assert_eq!(status.remaining, 10);
        assert_eq!(status.count, 0);
        assert_eq!(svc.quota_repo.len(), 1);

        // A second check reuses the record.
        svc.check_quota("t1").await.unwrap();
        assert_eq!(svc.quota_repo.len(), 1);
    }

    #[tokio::test]
    async fn test_check_quota_clamps_overseeded_count() {
        let svc = service();
        svc.quota_repo.seed("t2", 15).await;

        let status = svc.check_quota("t2").await.unwrap();
        assert!(!status.can_send);
        assert_eq!(status.remaining, 0);
        assert_eq!(status.count, 15);
    }

    #[tokio::test]
    async fn test_create_session_defaults_title() {
        let svc = service();
        let session = svc.create_session(None, Some("t"), None).await.unwrap();
        assert_eq!(session.title, "New Chat");

        let session = svc
            .create_session(None, Some("t"), Some(String::new()))
            .await
            .unwrap();
        assert_eq!(session.title, "New Chat");

        let session = svc
            .create_session(None, Some("t"), Some("Rust questions".to_string()))
            .await
            .unwrap();
        assert_eq!(session.title, "Rust questions");
    }

    #[tokio::test]
    async fn test_create_session_anonymous_registers_quota_and_link() {
        let svc = service();
        let session = svc.create_session(None, Some("t3"), None).await.unwrap();

        assert!(session.is_anonymous());
        let quota = svc.quota_repo.get_by_token("t3").await.unwrap().unwrap();
        assert_eq!(quota.message_count, 0);

        let linked = svc.chat_repo.list_sessions_for_token("t3").await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].id, session.id);
    }

    #[tokio::test]
    async fn test_create_session_existing_token_count_untouched() {
        let svc = service();
        svc.quota_repo.seed("t4", 7).await;

        svc.create_session(None, Some("t4"), None).await.unwrap();

        let quota = svc.quota_repo.get_by_token("t4").await.unwrap().unwrap();
        assert_eq!(quota.message_count, 7);
        assert_eq!(svc.quota_repo.len(), 1);
    }

    #[tokio::test]
    async fn test_create_session_with_owner_skips_quota_bookkeeping() {
        let svc = service();
        let owner = Uuid::now_v7();

        let session = svc
            .create_session(Some(owner), Some("t5"), None)
            .await
            .unwrap();

        assert_eq!(session.user_id, Some(owner));
        assert!(svc.quota_repo.get_by_token("t5").await.unwrap().is_none());
        assert!(
            svc.chat_repo
                .list_sessions_for_token("t5")
                .await
                .unwrap()
                .is_empty()
        );
    }
}
