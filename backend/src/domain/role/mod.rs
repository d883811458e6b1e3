//! Role aggregate.
//!
//! A role is an authorization grant referenced by users through its
//! [`RoleId`]. Roles are soft deleted: once [`Role::mark_as_deleted`] succeeds
//! the aggregate becomes read-only and every further mutation is rejected with
//! [`RoleError::Deleted`].

mod record;
mod values;

pub use record::RoleRecord;
pub use values::{
    ROLE_DESCRIPTION_MAX, ROLE_NAME_MAX, ROLE_NAME_MIN, RoleDescription, RoleDetails, RoleName,
    RoleValidationError,
};

use chrono::{DateTime, Utc};

use crate::domain::{Error, RoleId};

/// Errors raised by [`Role`] mutators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    #[error(transparent)]
    Validation(#[from] RoleValidationError),
    #[error("role {id} is deleted")]
    Deleted { id: RoleId },
}

impl From<RoleError> for Error {
    fn from(value: RoleError) -> Self {
        match value {
            RoleError::Validation(error) => Error::validation(&error),
            RoleError::Deleted { .. } => {
                Error::conflict(value.to_string()).with_reason("role_is_deleted")
            }
        }
    }
}

impl From<RoleValidationError> for Error {
    fn from(value: RoleValidationError) -> Self {
        Error::validation(&value)
    }
}

/// Authorization grant with soft delete and a default-role flag.
///
/// ## Invariants
/// - `name` is always 3 to 100 characters once trimmed.
/// - `deleted_at` is present exactly when the role is deleted.
/// - A deleted role never changes again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    id: RoleId,
    name: RoleName,
    description: RoleDescription,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    version: u64,
}

impl Role {
    /// Create a new, non-deleted role at version 0.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use identity_backend::domain::{Role, RoleDetails};
    ///
    /// let details = RoleDetails::try_new("ADMIN", None, false).expect("valid details");
    /// let role = Role::create(details, Utc::now());
    /// assert_eq!(role.version(), 0);
    /// assert!(!role.is_deleted());
    /// ```
    pub fn create(details: RoleDetails, now: DateTime<Utc>) -> Self {
        let RoleDetails {
            name,
            description,
            is_default,
        } = details;
        Self {
            id: RoleId::random(),
            name,
            description,
            is_default,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            version: 0,
        }
    }

    /// Replace the name, description and default flag.
    pub fn update(&mut self, details: RoleDetails, now: DateTime<Utc>) -> Result<(), RoleError> {
        self.ensure_not_deleted()?;
        let RoleDetails {
            name,
            description,
            is_default,
        } = details;
        self.name = name;
        self.description = description;
        self.is_default = is_default;
        self.updated_at = now;
        Ok(())
    }

    /// Soft delete the role. Deleting twice fails.
    pub fn mark_as_deleted(&mut self, now: DateTime<Utc>) -> Result<(), RoleError> {
        self.ensure_not_deleted()?;
        self.deleted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    fn ensure_not_deleted(&self) -> Result<(), RoleError> {
        if self.is_deleted() {
            return Err(RoleError::Deleted {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    pub fn id(&self) -> &RoleId {
        &self.id
    }

    pub fn name(&self) -> &RoleName {
        &self.name
    }

    pub fn description(&self) -> &RoleDescription {
        &self.description
    }

    /// Whether new users receive this role on registration.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Optimistic concurrency version assigned by the repository.
    pub fn version(&self) -> u64 {
        self.version
    }
}
