//! ChatRepository trait definition.
//!
//! Provides persistence operations for chat sessions, messages, and the
//! token-to-session links that scope anonymous listings.

use parley_types::chat::{ChatMessage, ChatSession};
use parley_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat session and message persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Create a new chat session.
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Get a chat session by its unique ID.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// List sessions owned by a user, ordered by updated_at DESC.
    fn list_sessions_for_user(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// List anonymous sessions linked to a token, ordered by updated_at DESC.
    ///
    /// Only sessions recorded via [`link_session_token`](Self::link_session_token)
    /// are returned; never an unscoped list of all anonymous sessions.
    fn list_sessions_for_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Record that an anonymous session was created under a token.
    fn link_session_token(
        &self,
        token: &str,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Persist one message exchange atomically: the user message, the
    /// assistant reply, and the session's updated_at advanced to the user
    /// message's timestamp. Either all three writes land or none do.
    fn append_exchange(
        &self,
        user_message: &ChatMessage,
        assistant_message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get all messages for a session, ordered by created_at ASC.
    fn get_messages(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Get the total number of messages in a session.
    fn count_messages(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
