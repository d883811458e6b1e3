//! Port for MFA secret handling.
//!
//! The gateway owns every piece of key material. The domain only ever holds
//! the [`EncryptedSecret`] it returns, and asks the gateway to check codes
//! against it or to render the enrollment QR code.

use crate::domain::{Email, EncryptedSecret, MfaQrCode, MfaType};

use super::CapabilityError;

/// MFA secret generation, code verification, and QR code rendering.
#[cfg_attr(test, mockall::automock)]
pub trait MfaGateway: Send + Sync {
    /// Generate a new shared secret for `mfa_type`, returned sealed.
    fn generate_secret(&self, mfa_type: MfaType) -> Result<EncryptedSecret, CapabilityError>;

    /// Whether `code` is currently valid for the sealed `secret`.
    fn accepts(
        &self,
        mfa_type: MfaType,
        code: &str,
        secret: &EncryptedSecret,
    ) -> Result<bool, CapabilityError>;

    /// Render the provisioning QR code the user scans into an authenticator.
    fn confirmation_qr_code(
        &self,
        secret: &EncryptedSecret,
        email: &Email,
        issuer: &str,
    ) -> Result<MfaQrCode, CapabilityError>;
}
