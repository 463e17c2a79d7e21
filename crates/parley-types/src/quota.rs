//! Anonymous session quota types.
//!
//! One `AnonymousQuota` record exists per anonymous browser/terminal session,
//! identified by an opaque token. The message count increments by exactly one
//! per successful send (not two, despite two messages being written).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quota record for an anonymous session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymousQuota {
    pub id: Uuid,
    /// Opaque token presented by the anonymous caller.
    pub session_token: String,
    /// Messages sent under this token so far.
    pub message_count: u32,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Result of a quota check against the configured message limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub can_send: bool,
    pub remaining: u32,
    pub count: u32,
}

impl QuotaStatus {
    /// Compute the status for a given count and limit.
    ///
    /// A record pre-seeded above the limit clamps `remaining` to zero rather
    /// than going negative.
    pub fn from_count(count: u32, limit: u32) -> Self {
        Self {
            can_send: count < limit,
            remaining: limit.saturating_sub(count),
            count,
        }
    }
}
