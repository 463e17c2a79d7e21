//! In-memory repository fakes for service tests.
//!
//! Simple `Mutex<HashMap>` implementations of the repository traits. No
//! lock is held across an await point; every method completes its work
//! synchronously inside the lock.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use parley_types::chat::{ChatMessage, ChatSession};
use parley_types::error::RepositoryError;
use parley_types::quota::AnonymousQuota;

use crate::chat::repository::ChatRepository;
use crate::quota::repository::QuotaRepository;

#[derive(Default)]
pub(crate) struct InMemoryChatRepository {
    sessions: Mutex<HashMap<Uuid, ChatSession>>,
    messages: Mutex<Vec<ChatMessage>>,
    links: Mutex<Vec<(String, Uuid)>>,
}

impl ChatRepository for InMemoryChatRepository {
    async fn create_session(
        &self,
        session: &ChatSession,
    ) -> Result<ChatSession, RepositoryError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id, session.clone());
        Ok(session.clone())
    }

    async fn get_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }

    async fn list_sessions_for_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let mut sessions: Vec<ChatSession> = self
            .sessions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user_id.as_ref() == Some(user_id))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn list_sessions_for_token(
        &self,
        token: &str,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let linked: Vec<Uuid> = self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == token)
            .map(|(_, id)| *id)
            .collect();
        let sessions = self.sessions.lock().unwrap();
        let mut result: Vec<ChatSession> = linked
            .iter()
            .filter_map(|id| sessions.get(id).cloned())
            .collect();
        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(result)
    }

    async fn link_session_token(
        &self,
        token: &str,
        session_id: &Uuid,
    ) -> Result<(), RepositoryError> {
        self.links
            .lock()
            .unwrap()
            .push((token.to_string(), *session_id));
        Ok(())
    }

    async fn append_exchange(
        &self,
        user_message: &ChatMessage,
        assistant_message: &ChatMessage,
    ) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(&user_message.session_id)
            .ok_or(RepositoryError::NotFound)?;
        session.updated_at = user_message.created_at;

        let mut messages = self.messages.lock().unwrap();
        messages.push(user_message.clone());
        messages.push(assistant_message.clone());
        Ok(())
    }

    async fn get_messages(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let mut messages: Vec<ChatMessage> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.session_id == *session_id)
            .cloned()
            .collect();
        // Stable sort keeps user-before-assistant for equal timestamps.
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    async fn count_messages(&self, session_id: &Uuid) -> Result<u64, RepositoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.session_id == *session_id)
            .count() as u64)
    }
}

#[derive(Default)]
pub(crate) struct InMemoryQuotaRepository {
    rows: Mutex<HashMap<String, AnonymousQuota>>,
}

impl InMemoryQuotaRepository {
    /// Number of quota records stored.
    pub(crate) fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Insert a record with the given count, bypassing the service path.
    pub(crate) async fn seed(&self, token: &str, count: u32) {
        let now = Utc::now();
        let quota = AnonymousQuota {
            id: Uuid::now_v7(),
            session_token: token.to_string(),
            message_count: count,
            created_at: now,
            last_activity: now,
        };
        self.rows.lock().unwrap().insert(token.to_string(), quota);
    }
}

impl QuotaRepository for InMemoryQuotaRepository {
    async fn get_by_token(
        &self,
        token: &str,
    ) -> Result<Option<AnonymousQuota>, RepositoryError> {
        Ok(self.rows.lock().unwrap().get(token).cloned())
    }

    async fn create(&self, quota: &AnonymousQuota) -> Result<AnonymousQuota, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&quota.session_token) {
            return Err(RepositoryError::Conflict(format!(
                "token '{}' already registered",
                quota.session_token
            )));
        }
        rows.insert(quota.session_token.clone(), quota.clone());
        Ok(quota.clone())
    }

    async fn touch_activity(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let quota = rows.get_mut(token).ok_or(RepositoryError::NotFound)?;
        quota.last_activity = at;
        Ok(())
    }

    async fn try_consume(
        &self,
        token: &str,
        limit: u32,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(token) {
            Some(quota) if quota.message_count < limit => {
                quota.message_count += 1;
                quota.last_activity = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
