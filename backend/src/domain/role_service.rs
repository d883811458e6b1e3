//! Role administration service.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::ports::RoleRepository;
use crate::domain::repository_errors::map_role_repository_error;
use crate::domain::{Error, Role, RoleDetails, RoleId};

/// Creates, updates, and soft deletes roles.
#[derive(Clone)]
pub struct RoleService<R> {
    roles: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> RoleService<R> {
    /// Create a new service with the given repository and clock.
    pub fn new(roles: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { roles, clock }
    }
}

impl<R> RoleService<R>
where
    R: RoleRepository,
{
    fn role_not_found(id: &RoleId) -> Error {
        Error::not_found(format!("role {id} not found")).with_reason("role_not_found")
    }

    async fn ensure_name_free(&self, details: &RoleDetails) -> Result<(), Error> {
        let taken = self
            .roles
            .exists_by_name(&details.name)
            .await
            .map_err(map_role_repository_error)?;
        if taken {
            return Err(
                Error::conflict(format!("role name {} is already taken", details.name))
                    .with_reason("role_name_taken"),
            );
        }
        Ok(())
    }

    async fn load(&self, id: &RoleId) -> Result<Role, Error> {
        self.roles
            .find_by_id(id)
            .await
            .map_err(map_role_repository_error)?
            .ok_or_else(|| Self::role_not_found(id))
    }

    /// Create a role with a unique name.
    pub async fn create(&self, details: RoleDetails) -> Result<Role, Error> {
        self.ensure_name_free(&details).await?;
        let role = Role::create(details, self.clock.utc());
        let saved = self
            .roles
            .save(&role)
            .await
            .map_err(map_role_repository_error)?;
        info!(role_id = %saved.id(), name = %saved.name(), "role created");
        Ok(saved)
    }

    /// Replace a role's attributes. Renaming onto a taken name fails.
    pub async fn update(&self, id: &RoleId, details: RoleDetails) -> Result<Role, Error> {
        let mut role = self.load(id).await?;
        if role.name() != &details.name {
            self.ensure_name_free(&details).await?;
        }
        role.update(details, self.clock.utc())?;
        self.roles
            .save(&role)
            .await
            .map_err(map_role_repository_error)
    }

    /// Soft delete a role. Deleting an already deleted role fails with
    /// `role_is_deleted`.
    pub async fn delete(&self, id: &RoleId) -> Result<Role, Error> {
        let mut role = self.load(id).await?;
        role.mark_as_deleted(self.clock.utc())?;
        let saved = self
            .roles
            .save(&role)
            .await
            .map_err(map_role_repository_error)?;
        info!(role_id = %saved.id(), "role deleted");
        Ok(saved)
    }

    /// Fetch a role by id, deleted or not.
    pub async fn find(&self, id: &RoleId) -> Result<Role, Error> {
        self.load(id).await
    }

    /// Live roles granted to every new user.
    pub async fn default_roles(&self) -> Result<Vec<Role>, Error> {
        self.roles
            .find_default_roles()
            .await
            .map_err(map_role_repository_error)
    }
}

#[cfg(test)]
#[path = "role_service_tests.rs"]
mod tests;
