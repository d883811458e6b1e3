//! User aggregate.
//!
//! The user is the identity root: it owns the credential hash, the set of
//! granted role identifiers, and at most one MFA device. Roles are referenced
//! by [`RoleId`] only; whether a role still exists is the caller's concern.
//!
//! Capabilities (password hashing, MFA secret handling) are passed into the
//! mutators that need them so the aggregate stays synchronous and free of
//! infrastructure.

mod email;
mod password;
mod person_name;
mod record;

pub use email::{EMAIL_MAX, Email};
pub use password::{PASSWORD_MAX, PASSWORD_MIN, Password, PasswordHash};
pub use person_name::{NAME_PART_MAX, PersonName};
pub use record::UserRecord;

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::ports::{CapabilityError, MfaGateway, PasswordHasher};
use crate::domain::{
    CustomerId, DeviceName, Error, MfaDevice, MfaError, MfaType, RoleId, UserId,
};

/// Validation errors returned by user value objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyFirstName,
    FirstNameTooLong { max: usize },
    EmptyLastName,
    LastNameTooLong { max: usize },
    EmptyEmail,
    EmailTooLong { max: usize },
    InvalidEmail,
    PasswordTooShort { min: usize },
    PasswordTooLong { max: usize },
    EmptyPasswordHash,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFirstName => write!(f, "first name must not be empty"),
            Self::FirstNameTooLong { max } => {
                write!(f, "first name must be at most {max} characters")
            }
            Self::EmptyLastName => write!(f, "last name must not be empty"),
            Self::LastNameTooLong { max } => {
                write!(f, "last name must be at most {max} characters")
            }
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::PasswordTooLong { max } => {
                write!(f, "password must be at most {max} characters")
            }
            Self::EmptyPasswordHash => write!(f, "password hash must not be empty"),
        }
    }
}

impl std::error::Error for UserValidationError {}

impl From<UserValidationError> for Error {
    fn from(value: UserValidationError) -> Self {
        Error::validation(&value)
    }
}

/// Errors raised by [`User`] mutators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserError {
    #[error("user {id} is deleted")]
    Deleted { id: UserId },
    #[error(transparent)]
    Mfa(#[from] MfaError),
    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

impl From<UserError> for Error {
    fn from(value: UserError) -> Self {
        match value {
            UserError::Deleted { .. } => {
                Error::conflict(value.to_string()).with_reason("user_is_deleted")
            }
            UserError::Mfa(error) => Error::from(error),
            UserError::Capability(error) => Error::from(error),
        }
    }
}

/// Validated registration input for [`User::create`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub customer_id: CustomerId,
    pub name: PersonName,
    pub email: Email,
    pub password: Password,
}

/// Identity root for an account.
///
/// ## Invariants
/// - `deleted_at` is present exactly when the user is deleted, and a deleted
///   user never changes again.
/// - `role_ids` has set semantics.
/// - At most one MFA device exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    customer_id: CustomerId,
    name: PersonName,
    email: Email,
    password: PasswordHash,
    email_verified: bool,
    role_ids: BTreeSet<RoleId>,
    mfa: Option<MfaDevice>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    version: u64,
}

impl User {
    /// Register a new user seeded with `default_role_ids`.
    ///
    /// The plaintext password is hashed immediately and dropped.
    pub fn create(
        new_user: NewUser,
        default_role_ids: impl IntoIterator<Item = RoleId>,
        hasher: &dyn PasswordHasher,
        now: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let NewUser {
            customer_id,
            name,
            email,
            password,
        } = new_user;
        let password = hasher.hash(&password)?;
        Ok(Self {
            id: UserId::random(),
            customer_id,
            name,
            email,
            password,
            email_verified: false,
            role_ids: default_role_ids.into_iter().collect(),
            mfa: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            version: 0,
        })
    }

    pub fn change_name(&mut self, name: PersonName, now: DateTime<Utc>) -> Result<(), UserError> {
        self.ensure_not_deleted()?;
        self.name = name;
        self.touch(now);
        Ok(())
    }

    /// Replace the email address. Verification is always reset, even when
    /// the address is unchanged.
    pub fn change_email(&mut self, email: Email, now: DateTime<Utc>) -> Result<(), UserError> {
        self.ensure_not_deleted()?;
        self.email = email;
        self.email_verified = false;
        self.touch(now);
        Ok(())
    }

    /// Mark the current address as verified.
    ///
    /// Callers must have redeemed a matching email-confirmation token first.
    pub fn confirm_email(&mut self, now: DateTime<Utc>) -> Result<(), UserError> {
        self.ensure_not_deleted()?;
        self.email_verified = true;
        self.touch(now);
        Ok(())
    }

    pub fn change_password(
        &mut self,
        password: &Password,
        hasher: &dyn PasswordHasher,
        now: DateTime<Utc>,
    ) -> Result<(), UserError> {
        self.ensure_not_deleted()?;
        self.password = hasher.hash(password)?;
        self.touch(now);
        Ok(())
    }

    /// Grant roles. Ids already held are ignored.
    pub fn add_roles(
        &mut self,
        role_ids: impl IntoIterator<Item = RoleId>,
        now: DateTime<Utc>,
    ) -> Result<(), UserError> {
        self.ensure_not_deleted()?;
        self.role_ids.extend(role_ids);
        self.touch(now);
        Ok(())
    }

    /// Revoke a role. Revoking a role the user does not hold is a no-op.
    pub fn remove_role(&mut self, role_id: &RoleId, now: DateTime<Utc>) -> Result<(), UserError> {
        self.ensure_not_deleted()?;
        self.role_ids.remove(role_id);
        self.touch(now);
        Ok(())
    }

    /// Enroll a new MFA device, replacing any device still pending
    /// confirmation.
    pub fn create_mfa(
        &mut self,
        mfa_type: MfaType,
        device_name: DeviceName,
        gateway: &dyn MfaGateway,
        now: DateTime<Utc>,
        confirmation_window: TimeDelta,
    ) -> Result<&MfaDevice, UserError> {
        self.ensure_not_deleted()?;
        if self.mfa.as_ref().is_some_and(MfaDevice::is_enabled) {
            return Err(MfaError::AlreadyEnabled.into());
        }
        let device = MfaDevice::enroll(mfa_type, device_name, gateway, now, confirmation_window)?;
        self.touch(now);
        Ok(self.mfa.insert(device))
    }

    /// Confirm the pending device with a code from the authenticator.
    pub fn confirm_mfa_device(
        &mut self,
        code: &str,
        gateway: &dyn MfaGateway,
        now: DateTime<Utc>,
    ) -> Result<(), UserError> {
        self.ensure_not_deleted()?;
        let device = self.mfa.as_mut().ok_or(MfaError::NoDeviceEnrolled)?;
        device.confirm(code, gateway, now)?;
        self.touch(now);
        Ok(())
    }

    /// Remove the MFA device and its secret, whatever its state.
    pub fn disable_mfa(&mut self, now: DateTime<Utc>) -> Result<(), UserError> {
        self.ensure_not_deleted()?;
        if self.mfa.take().is_none() {
            return Err(MfaError::NoDeviceEnrolled.into());
        }
        self.touch(now);
        Ok(())
    }

    /// Soft delete the user. Deleting twice fails.
    pub fn mark_as_deleted(&mut self, now: DateTime<Utc>) -> Result<(), UserError> {
        self.ensure_not_deleted()?;
        self.deleted_at = Some(now);
        self.touch(now);
        Ok(())
    }

    fn ensure_not_deleted(&self) -> Result<(), UserError> {
        if self.is_deleted() {
            return Err(UserError::Deleted {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    pub fn name(&self) -> &PersonName {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password(&self) -> &PasswordHash {
        &self.password
    }

    pub fn is_email_verified(&self) -> bool {
        self.email_verified
    }

    pub fn role_ids(&self) -> &BTreeSet<RoleId> {
        &self.role_ids
    }

    pub fn has_role(&self, role_id: &RoleId) -> bool {
        self.role_ids.contains(role_id)
    }

    pub fn mfa(&self) -> Option<&MfaDevice> {
        self.mfa.as_ref()
    }

    /// True once a device has been confirmed and switched on.
    pub fn is_mfa_enabled(&self) -> bool {
        self.mfa.as_ref().is_some_and(MfaDevice::is_enabled)
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

    pub fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests;
