//! Storage shape for [`User`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Email, PasswordHash, PersonName, User};
use crate::domain::{CustomerId, MfaDevice, MfaDeviceRecord, RecordError, RoleId, UserId};

/// Flat, serialisable representation of a user row and its MFA device.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub customer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub email_verified: bool,
    pub role_ids: Vec<Uuid>,
    pub mfa: Option<MfaDeviceRecord>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("customer_id", &self.customer_id)
            .field("email", &self.email)
            .field("email_verified", &self.email_verified)
            .field("role_ids", &self.role_ids)
            .field("mfa", &self.mfa)
            .field("is_deleted", &self.is_deleted)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            customer_id: user.customer_id.as_ref().to_owned(),
            first_name: user.name.first().to_owned(),
            last_name: user.name.last().to_owned(),
            email: user.email.as_ref().to_owned(),
            password_hash: user.password.as_str().to_owned(),
            email_verified: user.email_verified,
            role_ids: user.role_ids.iter().map(|id| *id.as_uuid()).collect(),
            mfa: user.mfa.as_ref().map(MfaDeviceRecord::from),
            is_deleted: user.is_deleted(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            deleted_at: user.deleted_at,
            version: user.version,
        }
    }
}

impl TryFrom<UserRecord> for User {
    type Error = RecordError;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        if record.is_deleted != record.deleted_at.is_some() {
            return Err(RecordError::Inconsistent(
                "user deletion flag disagrees with deletion timestamp",
            ));
        }

        let customer_id = CustomerId::new(record.customer_id)
            .map_err(|err| RecordError::invalid_field("customerId", err))?;
        let name = PersonName::new(record.first_name, record.last_name)
            .map_err(|err| RecordError::invalid_field("name", err))?;
        let email =
            Email::new(record.email).map_err(|err| RecordError::invalid_field("email", err))?;
        let password = PasswordHash::new(record.password_hash)
            .map_err(|err| RecordError::invalid_field("passwordHash", err))?;
        let mfa = record.mfa.map(MfaDevice::try_from).transpose()?;

        Ok(Self {
            id: UserId::from_uuid(record.id),
            customer_id,
            name,
            email,
            password,
            email_verified: record.email_verified,
            role_ids: record.role_ids.into_iter().map(RoleId::from_uuid).collect(),
            mfa,
            created_at: record.created_at,
            updated_at: record.updated_at,
            deleted_at: record.deleted_at,
            version: record.version,
        })
    }
}
