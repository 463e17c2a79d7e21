//! Messaging service: appends a user message and the synthesized assistant
//! reply to a session.
//!
//! Quota enforcement happens before any message is written, as a single
//! atomic consume on the quota record; the exchange itself (two messages
//! plus the session touch) is one atomic repository call.

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use parley_types::chat::{ChatMessage, MessageExchange, MessageRole};
use parley_types::error::ChatError;

use crate::chat::reply::ReplyGenerator;
use crate::chat::repository::ChatRepository;
use crate::quota::repository::QuotaRepository;

/// Orchestrates message persistence and quota consumption.
pub struct MessagingService<C: ChatRepository, Q: QuotaRepository, G: ReplyGenerator> {
    chat_repo: C,
    quota_repo: Q,
    reply: G,
    message_limit: u32,
}

impl<C: ChatRepository, Q: QuotaRepository, G: ReplyGenerator> MessagingService<C, Q, G> {
    /// Create a new messaging service with the given repositories and
    /// reply generator.
    pub fn new(chat_repo: C, quota_repo: Q, reply: G, message_limit: u32) -> Self {
        Self {
            chat_repo,
            quota_repo,
            reply,
            message_limit,
        }
    }

    /// Send a message to a session.
    ///
    /// Writes the user message at time T and the assistant reply at T + 1s
    /// (strictly after, so ordering survives shared timestamp resolution),
    /// and advances the session's updated_at to T. For anonymous callers the
    /// token's quota is consumed atomically before anything is written: a
    /// send at the limit fails with [`ChatError::QuotaExceeded`] and
    /// persists nothing.
    pub async fn send(
        &self,
        session_id: Uuid,
        content: &str,
        token: Option<&str>,
    ) -> Result<MessageExchange, ChatError> {
        if content.is_empty() {
            return Err(ChatError::EmptyContent);
        }

        self.chat_repo
            .get_session(&session_id)
            .await?
            .ok_or(ChatError::SessionNotFound)?;

        let now = Utc::now();

        if let Some(token) = token {
            let consumed = self
                .quota_repo
                .try_consume(token, self.message_limit, now)
                .await?;
            if !consumed {
                // Zero rows touched: either the token was never registered
                // or its count is at the limit.
                return match self.quota_repo.get_by_token(token).await? {
                    None => Err(ChatError::QuotaNotFound),
                    Some(_) => Err(ChatError::QuotaExceeded),
                };
            }
        }

        let reply_content = self.reply.generate(content).await?;

        let user_message = ChatMessage {
            id: Uuid::now_v7(),
            session_id,
            role: MessageRole::User,
            content: content.to_string(),
            created_at: now,
        };
        let assistant_message = ChatMessage {
            id: Uuid::now_v7(),
            session_id,
            role: MessageRole::Assistant,
            content: reply_content,
            created_at: now + Duration::seconds(1),
        };

        self.chat_repo
            .append_exchange(&user_message, &assistant_message)
            .await?;

        info!(session_id = %session_id, tokened = token.is_some(), "Message exchange appended");

        Ok(MessageExchange {
            user_message,
            assistant_message,
        })
    }
}
