//! Chat session and message types for Parley.
//!
//! Sessions belong to a registered user or to nobody (anonymous); messages
//! are always written in pairs (a user message plus the synthesized
//! assistant reply).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Author of a chat message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'assistant'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A chat session.
///
/// `user_id` is `None` for anonymous sessions; those are reachable only
/// through an anonymous session token. `updated_at` advances on every new
/// message so listings can order by recency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Whether this session has no owning user.
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}

/// A single message within a chat session.
///
/// Immutable once created. Messages are ordered by `created_at` within a
/// session; the assistant reply of a pair never sorts before its user
/// message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// The pair of messages produced by one send: the persisted user message and
/// the synthesized assistant reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageExchange {
    pub user_message: ChatMessage,
    pub assistant_message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_message_role_serde() {
        let role = MessageRole::Assistant;
        let json = serde_json::to_string(&role).unwrap();
        assert_eq!(json, "\"assistant\"");
        let parsed: MessageRole = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, MessageRole::Assistant);
    }

    #[test]
    fn test_message_role_rejects_unknown() {
        assert!("system".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_session_is_anonymous() {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::now_v7(),
            user_id: None,
            title: "New Chat".to_string(),
            created_at: now,
            updated_at: now,
        };
        assert!(session.is_anonymous());

        let owned = ChatSession {
            user_id: Some(Uuid::now_v7()),
            ..session
        };
        assert!(!owned.is_anonymous());
    }

    #[test]
    fn test_chat_session_serialize() {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::now_v7(),
            user_id: None,
            title: "Test chat".to_string(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"user_id\":null"));
        assert!(json.contains("\"title\":\"Test chat\""));
    }
}
