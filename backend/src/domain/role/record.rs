//! Storage shape for [`Role`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Role, RoleDescription, RoleName};
use crate::domain::{RecordError, RoleId};

/// Flat, serialisable representation of a role row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecord {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_default: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl From<&Role> for RoleRecord {
    fn from(role: &Role) -> Self {
        Self {
            id: *role.id.as_uuid(),
            name: role.name.as_ref().to_owned(),
            description: role.description.as_ref().to_owned(),
            is_default: role.is_default,
            is_deleted: role.is_deleted(),
            created_at: role.created_at,
            updated_at: role.updated_at,
            deleted_at: role.deleted_at,
            version: role.version,
        }
    }
}

impl TryFrom<RoleRecord> for Role {
    type Error = RecordError;

    fn try_from(record: RoleRecord) -> Result<Self, Self::Error> {
        let RoleRecord {
            id,
            name,
            description,
            is_default,
            is_deleted,
            created_at,
            updated_at,
            deleted_at,
            version,
        } = record;

        if is_deleted != deleted_at.is_some() {
            return Err(RecordError::Inconsistent(
                "role deletion flag disagrees with deletion timestamp",
            ));
        }

        Ok(Self {
            id: RoleId::from_uuid(id),
            name: RoleName::new(name).map_err(|err| RecordError::invalid_field("name", err))?,
            description: RoleDescription::new(description)
                .map_err(|err| RecordError::invalid_field("description", err))?,
            is_default,
            created_at,
            updated_at,
            deleted_at,
            version,
        })
    }
}
