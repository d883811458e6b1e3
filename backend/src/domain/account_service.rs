//! Account lifecycle service.
//!
//! Registration, profile changes, role assignment, and deletion. Every
//! mutation loads the user, applies one aggregate method, and saves under the
//! loaded version, so a concurrent writer surfaces as a
//! `concurrent_modification` conflict instead of a lost update.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    MailTokenRepository, PasswordHasher, RoleRepository, TokenGenerator, UserRepository,
};
use crate::domain::repository_errors::{map_role_repository_error, map_user_repository_error};
use crate::domain::verification_service::issue_token;
use crate::domain::{
    CustomerId, Email, Error, IdentityPolicy, MailToken, MailTokenType, NewUser, Password,
    PersonName, RoleId, User, UserId,
};

/// Raw registration input.
#[derive(Clone)]
pub struct RegisterUserRequest {
    pub customer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterUserRequest")
            .field("customer_id", &self.customer_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl RegisterUserRequest {
    fn validate(self) -> Result<NewUser, Error> {
        let customer_id =
            CustomerId::new(self.customer_id).map_err(|err| Error::validation(&err))?;
        Ok(NewUser {
            customer_id,
            name: PersonName::new(self.first_name, self.last_name)?,
            email: Email::new(self.email)?,
            password: Password::new(self.password)?,
        })
    }
}

/// Account management service.
#[derive(Clone)]
pub struct AccountService<U, R, T> {
    users: Arc<U>,
    roles: Arc<R>,
    tokens: Arc<T>,
    hasher: Arc<dyn PasswordHasher>,
    generator: Arc<dyn TokenGenerator>,
    clock: Arc<dyn Clock>,
    policy: IdentityPolicy,
}

impl<U, R, T> AccountService<U, R, T> {
    /// Create a new service from its ports and policy.
    pub fn new(
        users: Arc<U>,
        roles: Arc<R>,
        tokens: Arc<T>,
        hasher: Arc<dyn PasswordHasher>,
        generator: Arc<dyn TokenGenerator>,
        clock: Arc<dyn Clock>,
        policy: IdentityPolicy,
    ) -> Self {
        Self {
            users,
            roles,
            tokens,
            hasher,
            generator,
            clock,
            policy,
        }
    }
}

impl<U, R, T> AccountService<U, R, T>
where
    U: UserRepository,
    R: RoleRepository,
    T: MailTokenRepository,
{
    fn email_taken() -> Error {
        Error::conflict("email is already registered").with_reason("email_taken")
    }

    async fn load(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(|| {
                Error::not_found(format!("user {id} not found")).with_reason("user_not_found")
            })
    }

    async fn persist(&self, user: &User) -> Result<User, Error> {
        self.users
            .save(user)
            .await
            .map_err(map_user_repository_error)
    }

    /// Register a new account seeded with the current default roles.
    pub async fn register(&self, request: RegisterUserRequest) -> Result<User, Error> {
        let new_user = request.validate()?;
        let taken = self
            .users
            .exists_by_email(&new_user.email)
            .await
            .map_err(map_user_repository_error)?;
        if taken {
            return Err(Self::email_taken());
        }

        let default_roles = self
            .roles
            .find_default_roles()
            .await
            .map_err(map_role_repository_error)?;
        let default_role_ids = default_roles
            .iter()
            .filter(|role| !role.is_deleted())
            .map(|role| role.id().clone());

        let user = User::create(
            new_user,
            default_role_ids,
            self.hasher.as_ref(),
            self.clock.utc(),
        )?;
        let saved = self.persist(&user).await?;
        info!(user_id = %saved.id(), "user registered");
        Ok(saved)
    }

    /// Fetch a user by id, deleted or not.
    pub async fn find(&self, id: &UserId) -> Result<User, Error> {
        self.load(id).await
    }

    pub async fn change_name(
        &self,
        id: &UserId,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, Error> {
        let name = PersonName::new(first_name, last_name)?;
        let mut user = self.load(id).await?;
        user.change_name(name, self.clock.utc())?;
        self.persist(&user).await
    }

    /// Change the email address and issue a confirmation token for it.
    ///
    /// Older confirmation tokens for the new address are discarded.
    pub async fn change_email(&self, id: &UserId, email: &str) -> Result<(User, MailToken), Error> {
        let email = Email::new(email)?;
        let owner = self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_user_repository_error)?;
        if owner.is_some_and(|owner| owner.id() != id) {
            return Err(Self::email_taken());
        }

        let mut user = self.load(id).await?;
        let now = self.clock.utc();
        user.change_email(email, now)?;
        let saved = self.persist(&user).await?;
        info!(user_id = %saved.id(), "user email changed");

        let token = issue_token(
            self.tokens.as_ref(),
            self.generator.as_ref(),
            &saved,
            MailTokenType::EmailConfirmation,
            self.policy.token_ttl(MailTokenType::EmailConfirmation),
            now,
        )
        .await?;
        Ok((saved, token))
    }

    pub async fn change_password(&self, id: &UserId, password: String) -> Result<User, Error> {
        let password = Password::new(password)?;
        let mut user = self.load(id).await?;
        user.change_password(&password, self.hasher.as_ref(), self.clock.utc())?;
        let saved = self.persist(&user).await?;
        info!(user_id = %saved.id(), "user password changed");
        Ok(saved)
    }

    /// Grant roles. Every id must name a live role.
    pub async fn assign_roles(&self, id: &UserId, role_ids: &[RoleId]) -> Result<User, Error> {
        let requested: BTreeSet<&RoleId> = role_ids.iter().collect();
        let found = self
            .roles
            .find_by_ids(role_ids)
            .await
            .map_err(map_role_repository_error)?;
        let live: BTreeSet<&RoleId> = found
            .iter()
            .filter(|role| !role.is_deleted())
            .map(|role| role.id())
            .collect();
        if let Some(missing) = requested.difference(&live).next() {
            return Err(Error::invalid_request(format!(
                "role {missing} does not exist or is deleted"
            ))
            .with_reason("unknown_role"));
        }

        let mut user = self.load(id).await?;
        user.add_roles(role_ids.iter().cloned(), self.clock.utc())?;
        self.persist(&user).await
    }

    /// Revoke a role. Revoking a role the user lacks still saves.
    pub async fn remove_role(&self, id: &UserId, role_id: &RoleId) -> Result<User, Error> {
        let mut user = self.load(id).await?;
        user.remove_role(role_id, self.clock.utc())?;
        self.persist(&user).await
    }

    /// Soft delete the account. Deleting twice fails with `user_is_deleted`.
    pub async fn delete(&self, id: &UserId) -> Result<User, Error> {
        let mut user = self.load(id).await?;
        user.mark_as_deleted(self.clock.utc())?;
        let saved = self.persist(&user).await?;
        info!(user_id = %saved.id(), "user deleted");
        Ok(saved)
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
