//! Opaque MFA secret material.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::MfaValidationError;

/// Sealed MFA shared secret.
///
/// Only the ciphertext produced by an [`MfaGateway`](crate::domain::ports::MfaGateway)
/// is ever stored here. The type has no `Display` impl and its `Debug` output
/// is redacted so the value cannot leak through logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EncryptedSecret(String);

impl EncryptedSecret {
    /// Wrap gateway ciphertext. Empty ciphertext is rejected.
    pub fn new(ciphertext: impl Into<String>) -> Result<Self, MfaValidationError> {
        let ciphertext = ciphertext.into();
        if ciphertext.is_empty() {
            return Err(MfaValidationError::EmptySecret);
        }
        Ok(Self(ciphertext))
    }

    /// Borrow the ciphertext for persistence or gateway calls.
    pub fn ciphertext(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for EncryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptedSecret(<redacted>)")
    }
}

impl From<EncryptedSecret> for String {
    fn from(value: EncryptedSecret) -> Self {
        value.0
    }
}

impl TryFrom<String> for EncryptedSecret {
    type Error = MfaValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Rendered enrollment QR code.
#[derive(Clone, PartialEq, Eq)]
pub struct MfaQrCode {
    media_type: &'static str,
    data: Vec<u8>,
}

impl MfaQrCode {
    pub fn new(media_type: &'static str, data: Vec<u8>) -> Self {
        Self { media_type, data }
    }

    /// MIME type of [`Self::data`], e.g. `image/svg+xml`.
    pub fn media_type(&self) -> &'static str {
        self.media_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

// The image embeds the raw shared secret.
impl fmt::Debug for MfaQrCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MfaQrCode")
            .field("media_type", &self.media_type)
            .field("len", &self.data.len())
            .finish()
    }
}
