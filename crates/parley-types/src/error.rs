use thiserror::Error;

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by the chat services.
///
/// Every variant carries a human-readable reason; none are retried
/// internally -- retry, if any, is the caller's policy.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat session not found")]
    SessionNotFound,

    #[error("access denied: session belongs to another user")]
    AccessDenied,

    #[error("session token required for anonymous sessions")]
    TokenRequired,

    #[error("invalid session token")]
    InvalidToken,

    #[error("anonymous session not found")]
    QuotaNotFound,

    #[error("message limit exceeded for anonymous users")]
    QuotaExceeded,

    #[error("message content must not be empty")]
    EmptyContent,

    #[error("reply generation failed: {0}")]
    Reply(#[from] ReplyError),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

/// Error from a reply generator backend.
///
/// The shipped template generator never fails; a real generator substituted
/// behind the same trait can.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ReplyError(pub String);
