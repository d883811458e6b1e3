//! Storage shape for [`MfaDevice`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DeviceName, EncryptedSecret, MfaDevice, MfaType};
use crate::domain::{MfaDeviceId, RecordError};

/// Serialisable MFA device, nested inside a user record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaDeviceRecord {
    pub id: Uuid,
    pub enabled: bool,
    pub verified: bool,
    pub device_name: Option<String>,
    pub device_verified: bool,
    pub mfa_type: MfaType,
    pub encrypted_secret: String,
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for MfaDeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MfaDeviceRecord")
            .field("id", &self.id)
            .field("enabled", &self.enabled)
            .field("verified", &self.verified)
            .field("device_name", &self.device_name)
            .field("device_verified", &self.device_verified)
            .field("mfa_type", &self.mfa_type)
            .field("valid_until", &self.valid_until)
            .finish_non_exhaustive()
    }
}

impl From<&MfaDevice> for MfaDeviceRecord {
    fn from(device: &MfaDevice) -> Self {
        Self {
            id: *device.id.as_uuid(),
            enabled: device.enabled,
            verified: device.verified,
            device_name: device
                .device_name
                .as_ref()
                .map(|name| name.as_ref().to_owned()),
            device_verified: device.device_verified,
            mfa_type: device.mfa_type,
            encrypted_secret: device.secret.ciphertext().to_owned(),
            valid_until: device.valid_until,
            created_at: device.created_at,
            updated_at: device.updated_at,
        }
    }
}

impl TryFrom<MfaDeviceRecord> for MfaDevice {
    type Error = RecordError;

    fn try_from(record: MfaDeviceRecord) -> Result<Self, Self::Error> {
        if record.verified && !record.enabled {
            return Err(RecordError::Inconsistent(
                "verified MFA device must be enabled",
            ));
        }
        if record.device_verified && record.device_name.is_none() {
            return Err(RecordError::Inconsistent(
                "verified MFA device must carry a device name",
            ));
        }

        let device_name = record
            .device_name
            .map(DeviceName::new)
            .transpose()
            .map_err(|err| RecordError::invalid_field("deviceName", err))?;
        let secret = EncryptedSecret::new(record.encrypted_secret)
            .map_err(|err| RecordError::invalid_field("encryptedSecret", err))?;

        Ok(Self {
            id: MfaDeviceId::from_uuid(record.id),
            mfa_type: record.mfa_type,
            device_name,
            device_verified: record.device_verified,
            verified: record.verified,
            enabled: record.enabled,
            secret,
            valid_until: record.valid_until,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}
