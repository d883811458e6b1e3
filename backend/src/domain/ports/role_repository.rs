//! Port for role persistence.
//!
//! Adapters store [`Role`] aggregates and enforce two rules the aggregate
//! cannot: role names are unique, and writes are guarded by the aggregate
//! version.

use async_trait::async_trait;

use crate::domain::{Role, RoleId, RoleName};

use super::define_port_error;

define_port_error! {
    /// Errors raised by role repository adapters.
    pub enum RoleRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "role repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "role repository query failed: {message}",
        /// Optimistic concurrency check failed.
        VersionMismatch { expected: u64, actual: u64 } =>
            "role version mismatch: expected {expected}, found {actual}",
        /// An update targeted a role that was never stored.
        NotFound { id: String } => "role {id} not found",
        /// Another role already uses the name.
        DuplicateName { name: String } => "role name {name} is already taken",
    }
}

/// Port for role storage and retrieval.
///
/// # Version semantics
///
/// - A role at version 0 that is not yet stored is inserted unchanged.
/// - Otherwise the write succeeds only when the stored version equals
///   `role.version()`, and the returned role carries version + 1.
/// - A mismatch yields [`RoleRepositoryError::VersionMismatch`]; adapters
///   never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Fetch a role by id, including deleted roles.
    async fn find_by_id(&self, id: &RoleId) -> Result<Option<Role>, RoleRepositoryError>;

    /// Fetch every stored role whose id appears in `ids`. Unknown ids are
    /// skipped.
    async fn find_by_ids(&self, ids: &[RoleId]) -> Result<Vec<Role>, RoleRepositoryError>;

    /// Whether any role, deleted or not, already uses `name`.
    async fn exists_by_name(&self, name: &RoleName) -> Result<bool, RoleRepositoryError>;

    /// Live roles flagged as default for new users.
    async fn find_default_roles(&self) -> Result<Vec<Role>, RoleRepositoryError>;

    /// Insert or conditionally update a role.
    async fn save(&self, role: &Role) -> Result<Role, RoleRepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn version_mismatch_error_formats_correctly() {
        let message = RoleRepositoryError::version_mismatch(2_u64, 5_u64).to_string();

        assert!(message.contains("expected 2"));
        assert!(message.contains("found 5"));
    }

    #[rstest]
    fn duplicate_name_mentions_the_name() {
        let error = RoleRepositoryError::duplicate_name("ADMIN");
        assert_eq!(error.to_string(), "role name ADMIN is already taken");
    }
}
