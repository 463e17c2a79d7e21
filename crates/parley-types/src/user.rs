//! Registered user type.
//!
//! Users are created out of band (seed scripts, future auth flow) -- no RPC
//! handler creates them. Immutable once created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user owning zero or more chat sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serde() {
        let user = User {
            id: Uuid::now_v7(),
            email: Some("test@example.com".to_string()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        let parsed: User = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.email.as_deref(), Some("test@example.com"));
    }
}
