//! UserRepository trait definition.
//!
//! Users are created out of band (seeding, future auth flow); no RPC handler
//! writes them, so the trait stays read-mostly.

use parley_types::error::RepositoryError;
use parley_types::user::User;
use uuid::Uuid;

/// Repository trait for registered users.
pub trait UserRepository: Send + Sync {
    /// Persist a new user record.
    fn create(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Get a user by ID.
    fn get(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;
}
