//! Port for mail token persistence.

use async_trait::async_trait;

use crate::domain::{Email, MailToken, TokenValue};

use super::define_port_error;

define_port_error! {
    /// Errors raised by mail token repository adapters.
    pub enum MailTokenRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "mail token repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "mail token repository query failed: {message}",
        /// Optimistic concurrency check failed.
        VersionMismatch { expected: u64, actual: u64 } =>
            "mail token version mismatch: expected {expected}, found {actual}",
        /// An update targeted a token that is no longer stored.
        NotFound { id: String } => "mail token {id} not found",
    }
}

/// Port for mail token storage.
///
/// Tokens are hard deleted once consumed or superseded. `save` follows the
/// version rules of the other repositories, so of two concurrent redemptions
/// of one token only the first write succeeds.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTokenRepository: Send + Sync {
    /// Insert or conditionally update a token.
    async fn save(&self, token: &MailToken) -> Result<MailToken, MailTokenRepositoryError>;

    /// Every stored token issued to `email`, oldest first.
    async fn find_by_email(&self, email: &Email)
    -> Result<Vec<MailToken>, MailTokenRepositoryError>;

    /// Look a token up by its secret value.
    async fn find_by_token(
        &self,
        token: &TokenValue,
    ) -> Result<Option<MailToken>, MailTokenRepositoryError>;

    /// Remove a token. Removing an unknown token succeeds.
    async fn delete_by_token(&self, token: &TokenValue) -> Result<(), MailTokenRepositoryError>;
}
