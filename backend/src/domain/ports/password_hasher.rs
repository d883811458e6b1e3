//! Port for one-way password hashing.

use crate::domain::{Password, PasswordHash};

use super::CapabilityError;

/// Salted, one-way password hashing capability.
///
/// Aggregates receive the hasher as a method argument and never see the
/// algorithm in use.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash `password` into an opaque, self-describing hash string.
    fn hash(&self, password: &Password) -> Result<PasswordHash, CapabilityError>;

    /// Check whether `password` matches a previously produced `hash`.
    fn verify(&self, password: &Password, hash: &PasswordHash) -> Result<bool, CapabilityError>;
}
