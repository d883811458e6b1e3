//! In-memory `RoleRepository`.

use async_trait::async_trait;
use tracing::debug;

use super::table::{Table, WriteConflict, WritePlan, decode, plan_write};
use crate::domain::ports::{RoleRepository, RoleRepositoryError};
use crate::domain::{Role, RoleId, RoleName, RoleRecord};

/// Role store holding [`RoleRecord`] rows behind a mutex.
///
/// Names are unique across live and deleted roles.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    table: Table<RoleRecord>,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn decode_role(record: RoleRecord) -> Result<Role, RoleRepositoryError> {
    decode(record, RoleRepositoryError::query)
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_by_id(&self, id: &RoleId) -> Result<Option<Role>, RoleRepositoryError> {
        let rows = self.table.lock(RoleRepositoryError::query)?;
        debug!(role_id = %id, "loading role");
        rows.get(id.as_uuid()).cloned().map(decode_role).transpose()
    }

    async fn find_by_ids(&self, ids: &[RoleId]) -> Result<Vec<Role>, RoleRepositoryError> {
        let rows = self.table.lock(RoleRepositoryError::query)?;
        debug!(count = ids.len(), "loading roles by id");
        ids.iter()
            .filter_map(|id| rows.get(id.as_uuid()).cloned())
            .map(decode_role)
            .collect()
    }

    async fn exists_by_name(&self, name: &RoleName) -> Result<bool, RoleRepositoryError> {
        let rows = self.table.lock(RoleRepositoryError::query)?;
        Ok(rows.values().any(|row| row.name == name.as_ref()))
    }

    async fn find_default_roles(&self) -> Result<Vec<Role>, RoleRepositoryError> {
        let rows = self.table.lock(RoleRepositoryError::query)?;
        let mut defaults: Vec<RoleRecord> = rows
            .values()
            .filter(|row| row.is_default && !row.is_deleted)
            .cloned()
            .collect();
        defaults.sort_by(|a, b| a.name.cmp(&b.name));
        defaults.into_iter().map(decode_role).collect()
    }

    async fn save(&self, role: &Role) -> Result<Role, RoleRepositoryError> {
        let mut rows = self.table.lock(RoleRepositoryError::query)?;
        let mut record = RoleRecord::from(role);
        if rows
            .values()
            .any(|row| row.id != record.id && row.name == record.name)
        {
            return Err(RoleRepositoryError::duplicate_name(record.name));
        }

        let stored = rows.get(&record.id).map(|row| row.version);
        match plan_write(stored, record.version) {
            Ok(WritePlan::Insert) => {}
            Ok(WritePlan::Update { next }) => record.version = next,
            Err(WriteConflict::Missing) => {
                return Err(RoleRepositoryError::not_found(role.id().to_string()));
            }
            Err(WriteConflict::Stale { expected, actual }) => {
                return Err(RoleRepositoryError::version_mismatch(expected, actual));
            }
        }

        debug!(role_id = %role.id(), version = record.version, "role written");
        rows.insert(record.id, record.clone());
        decode_role(record)
    }
}
