//! Port for user persistence.

use async_trait::async_trait;

use crate::domain::{Email, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "user repository query failed: {message}",
        /// Optimistic concurrency check failed.
        VersionMismatch { expected: u64, actual: u64 } =>
            "user version mismatch: expected {expected}, found {actual}",
        /// An update targeted a user that was never stored.
        NotFound { id: String } => "user {id} not found",
        /// Another user already owns the email address.
        DuplicateEmail { email: String } => "email {email} is already registered",
    }
}

/// Port for user storage and retrieval.
///
/// `save` follows the same version rules as
/// [`RoleRepository::save`](super::RoleRepository::save) and additionally
/// rejects a write that would give two users the same email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by id, including deleted users.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch the user currently owning `email`.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserRepositoryError>;

    /// Whether any user owns `email`.
    async fn exists_by_email(&self, email: &Email) -> Result<bool, UserRepositoryError>;

    /// Insert or conditionally update a user.
    async fn save(&self, user: &User) -> Result<User, UserRepositoryError>;
}
