//! QuotaRepository trait definition.
//!
//! Persistence operations for anonymous session quota records. The
//! consume operation is a single conditional update so two concurrent
//! sends can never both pass the ceiling.

use chrono::{DateTime, Utc};
use parley_types::error::RepositoryError;
use parley_types::quota::AnonymousQuota;

/// Repository trait for anonymous quota persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteQuotaRepository`).
pub trait QuotaRepository: Send + Sync {
    /// Look up a quota record by its session token.
    fn get_by_token(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Option<AnonymousQuota>, RepositoryError>> + Send;

    /// Persist a new quota record.
    fn create(
        &self,
        quota: &AnonymousQuota,
    ) -> impl std::future::Future<Output = Result<AnonymousQuota, RepositoryError>> + Send;

    /// Refresh last_activity without touching the message count.
    fn touch_activity(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Atomically consume one quota unit if the count is below `limit`,
    /// refreshing last_activity in the same statement.
    ///
    /// Returns `true` when a unit was consumed. `false` means the token has
    /// no record or its count is already at the limit; callers distinguish
    /// the two with a follow-up [`get_by_token`](Self::get_by_token).
    fn try_consume(
        &self,
        token: &str,
        limit: u32,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
