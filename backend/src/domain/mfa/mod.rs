//! Embedded MFA device state machine.
//!
//! A user owns at most one [`MfaDevice`]. The device moves through
//! enrollment, where a sealed secret is generated and a confirmation deadline
//! recorded, to confirmation, where the first code from the authenticator
//! proves possession and switches MFA on. Disabling removes the device and its
//! secret entirely, which [`User`](crate::domain::User) models by dropping it.

mod record;
mod secret;

pub use record::MfaDeviceRecord;
pub use secret::{EncryptedSecret, MfaQrCode};

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{CapabilityError, MfaGateway};
use crate::domain::{Error, MfaDeviceId};

/// Maximum allowed length for a device name.
pub const DEVICE_NAME_MAX: usize = 100;

/// Supported second factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum MfaType {
    /// Time-based one-time passwords from an authenticator app.
    Totp,
}

impl MfaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Totp => "TOTP",
        }
    }
}

/// Observable lifecycle state of an enrolled device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MfaStatus {
    PendingConfirmation,
    DeviceConfirmed,
    Enabled,
}

/// Validation errors returned by MFA value objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MfaValidationError {
    EmptyDeviceName,
    DeviceNameTooLong { max: usize },
    EmptySecret,
    /// `now + window` falls outside the representable time range.
    WindowOutOfRange,
}

impl fmt::Display for MfaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDeviceName => write!(f, "device name must not be empty"),
            Self::DeviceNameTooLong { max } => {
                write!(f, "device name must be at most {max} characters")
            }
            Self::EmptySecret => write!(f, "encrypted secret must not be empty"),
            Self::WindowOutOfRange => write!(f, "confirmation window is too large"),
        }
    }
}

impl std::error::Error for MfaValidationError {}

impl From<MfaValidationError> for Error {
    fn from(value: MfaValidationError) -> Self {
        Error::validation(&value)
    }
}

/// User-facing label for an authenticator, e.g. "Work phone".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceName(String);

impl DeviceName {
    /// Validate and construct a [`DeviceName`]; surrounding whitespace is
    /// trimmed.
    pub fn new(name: impl Into<String>) -> Result<Self, MfaValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(MfaValidationError::EmptyDeviceName);
        }
        if trimmed.chars().count() > DEVICE_NAME_MAX {
            return Err(MfaValidationError::DeviceNameTooLong {
                max: DEVICE_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DeviceName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DeviceName> for String {
    fn from(value: DeviceName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DeviceName {
    type Error = MfaValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// State errors raised by MFA operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MfaError {
    #[error("no MFA device is enrolled")]
    NoDeviceEnrolled,
    #[error("MFA is already enabled")]
    AlreadyEnabled,
    #[error("MFA confirmation window has expired")]
    ConfirmationExpired,
    #[error("MFA confirmation code was rejected")]
    ConfirmationFailed,
    #[error(transparent)]
    Validation(#[from] MfaValidationError),
    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

impl From<MfaError> for Error {
    fn from(value: MfaError) -> Self {
        let reason = match &value {
            MfaError::NoDeviceEnrolled => "no_mfa_device_enrolled",
            MfaError::AlreadyEnabled => "mfa_already_enabled",
            MfaError::ConfirmationExpired => "mfa_confirmation_expired",
            MfaError::ConfirmationFailed => {
                return Error::invalid_request(value.to_string())
                    .with_reason("mfa_confirmation_failed");
            }
            MfaError::Validation(cause) => return Error::validation(cause),
            MfaError::Capability(cause) => return Error::from(cause.clone()),
        };
        Error::conflict(value.to_string()).with_reason(reason)
    }
}

/// A user's second-factor device.
///
/// ## Invariants
/// - `verified` implies `enabled`.
/// - `device_verified` implies a device name is present.
/// - The secret is only ever held sealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaDevice {
    id: MfaDeviceId,
    mfa_type: MfaType,
    device_name: Option<DeviceName>,
    device_verified: bool,
    verified: bool,
    enabled: bool,
    secret: EncryptedSecret,
    valid_until: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MfaDevice {
    /// Start enrollment: generate a sealed secret and open the confirmation
    /// window `[now, now + window]`.
    pub fn enroll(
        mfa_type: MfaType,
        device_name: DeviceName,
        gateway: &dyn MfaGateway,
        now: DateTime<Utc>,
        window: TimeDelta,
    ) -> Result<Self, MfaError> {
        let valid_until = now
            .checked_add_signed(window)
            .ok_or(MfaValidationError::WindowOutOfRange)?;
        let secret = gateway.generate_secret(mfa_type)?;
        Ok(Self {
            id: MfaDeviceId::random(),
            mfa_type,
            device_name: Some(device_name),
            device_verified: false,
            verified: false,
            enabled: false,
            secret,
            valid_until: Some(valid_until),
            created_at: now,
            updated_at: now,
        })
    }

    /// Confirm possession of the device with a code from the authenticator.
    ///
    /// Nothing changes unless the call succeeds.
    pub fn confirm(
        &mut self,
        code: &str,
        gateway: &dyn MfaGateway,
        now: DateTime<Utc>,
    ) -> Result<(), MfaError> {
        if self.enabled {
            return Err(MfaError::AlreadyEnabled);
        }
        match self.valid_until {
            Some(deadline) if now <= deadline => {}
            _ => return Err(MfaError::ConfirmationExpired),
        }
        if !gateway.accepts(self.mfa_type, code, &self.secret)? {
            return Err(MfaError::ConfirmationFailed);
        }

        self.device_verified = true;
        self.verified = true;
        self.enabled = true;
        self.valid_until = None;
        self.updated_at = now;
        Ok(())
    }

    pub fn status(&self) -> MfaStatus {
        if self.enabled && self.verified {
            MfaStatus::Enabled
        } else if self.device_verified {
            MfaStatus::DeviceConfirmed
        } else {
            MfaStatus::PendingConfirmation
        }
    }

    pub fn id(&self) -> &MfaDeviceId {
        &self.id
    }

    pub fn mfa_type(&self) -> MfaType {
        self.mfa_type
    }

    pub fn device_name(&self) -> Option<&DeviceName> {
        self.device_name.as_ref()
    }

    pub fn is_device_verified(&self) -> bool {
        self.device_verified
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn secret(&self) -> &EncryptedSecret {
        &self.secret
    }

    /// Confirmation deadline while enrollment is pending.
    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.valid_until
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests;
