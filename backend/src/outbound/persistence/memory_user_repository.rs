//! In-memory `UserRepository`.

use async_trait::async_trait;
use tracing::debug;

use super::table::{Table, WriteConflict, WritePlan, decode, plan_write};
use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{Email, User, UserId, UserRecord};

/// User store holding [`UserRecord`] rows, MFA device included.
///
/// Email addresses are unique across live and deleted users.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    table: Table<UserRecord>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn decode_user(record: UserRecord) -> Result<User, UserRepositoryError> {
    decode(record, UserRepositoryError::query)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let rows = self.table.lock(UserRepositoryError::query)?;
        debug!(user_id = %id, "loading user");
        rows.get(id.as_uuid()).cloned().map(decode_user).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserRepositoryError> {
        let rows = self.table.lock(UserRepositoryError::query)?;
        rows.values()
            .find(|row| row.email == email.as_ref())
            .cloned()
            .map(decode_user)
            .transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> Result<bool, UserRepositoryError> {
        let rows = self.table.lock(UserRepositoryError::query)?;
        Ok(rows.values().any(|row| row.email == email.as_ref()))
    }

    async fn save(&self, user: &User) -> Result<User, UserRepositoryError> {
        let mut rows = self.table.lock(UserRepositoryError::query)?;
        let mut record = UserRecord::from(user);
        if rows
            .values()
            .any(|row| row.id != record.id && row.email == record.email)
        {
            return Err(UserRepositoryError::duplicate_email(record.email));
        }

        let stored = rows.get(&record.id).map(|row| row.version);
        match plan_write(stored, record.version) {
            Ok(WritePlan::Insert) => {}
            Ok(WritePlan::Update { next }) => record.version = next,
            Err(WriteConflict::Missing) => {
                return Err(UserRepositoryError::not_found(user.id().to_string()));
            }
            Err(WriteConflict::Stale { expected, actual }) => {
                return Err(UserRepositoryError::version_mismatch(expected, actual));
            }
        }

        debug!(user_id = %user.id(), version = record.version, "user written");
        rows.insert(record.id, record.clone());
        decode_user(record)
    }
}
