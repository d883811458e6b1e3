//! Email confirmation and password reset flows.
//!
//! Both flows issue a [`MailToken`] and later redeem it. Issuing discards
//! older tokens of the same type for the address. Redeeming marks the token
//! used and saves it under its version so a concurrent redemption loses. The
//! user change is then written, retried against a fresh copy if the user was
//! updated meanwhile, and the token is deleted only once that write lands.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    MailTokenRepository, PasswordHasher, TokenGenerator, UserRepository, UserRepositoryError,
};
use crate::domain::repository_errors::{
    map_mail_token_repository_error, map_user_repository_error,
};
use crate::domain::{
    Email, Error, IdentityPolicy, MailToken, MailTokenType, Password, TokenValue, User, UserError,
    UserId,
};

/// Writes of the redeeming user attempted before a conflict is reported.
const USER_WRITE_ATTEMPTS: usize = 3;

/// Issue a token of `token_type` for `user`, replacing older ones.
pub(crate) async fn issue_token<T>(
    tokens: &T,
    generator: &dyn TokenGenerator,
    user: &User,
    token_type: MailTokenType,
    ttl: TimeDelta,
    now: DateTime<Utc>,
) -> Result<MailToken, Error>
where
    T: MailTokenRepository,
{
    if user.is_deleted() {
        return Err(UserError::Deleted {
            id: user.id().clone(),
        }
        .into());
    }

    let existing = tokens
        .find_by_email(user.email())
        .await
        .map_err(map_mail_token_repository_error)?;
    for stale in existing
        .iter()
        .filter(|token| token.token_type() == token_type)
    {
        tokens
            .delete_by_token(stale.token())
            .await
            .map_err(map_mail_token_repository_error)?;
    }

    let token = MailToken::issue(
        user.email().clone(),
        user.id().clone(),
        token_type,
        ttl,
        generator,
        now,
    )?;
    let saved = tokens
        .save(&token)
        .await
        .map_err(map_mail_token_repository_error)?;
    info!(user_id = %user.id(), %token_type, expires_at = %saved.expires_at(), "mail token issued");
    Ok(saved)
}

/// Token-gated verification service.
#[derive(Clone)]
pub struct VerificationService<U, T> {
    users: Arc<U>,
    tokens: Arc<T>,
    hasher: Arc<dyn PasswordHasher>,
    generator: Arc<dyn TokenGenerator>,
    clock: Arc<dyn Clock>,
    policy: IdentityPolicy,
}

impl<U, T> VerificationService<U, T> {
    /// Create a new service from its ports and policy.
    pub fn new(
        users: Arc<U>,
        tokens: Arc<T>,
        hasher: Arc<dyn PasswordHasher>,
        generator: Arc<dyn TokenGenerator>,
        clock: Arc<dyn Clock>,
        policy: IdentityPolicy,
    ) -> Self {
        Self {
            users,
            tokens,
            hasher,
            generator,
            clock,
            policy,
        }
    }
}

impl<U, T> VerificationService<U, T>
where
    U: UserRepository,
    T: MailTokenRepository,
{
    fn token_not_found() -> Error {
        Error::not_found("token not found").with_reason("token_not_found")
    }

    fn user_not_found() -> Error {
        Error::not_found("user not found").with_reason("user_not_found")
    }

    async fn load_user(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(Self::user_not_found)
    }

    async fn issue(&self, user: &User, token_type: MailTokenType) -> Result<MailToken, Error> {
        issue_token(
            self.tokens.as_ref(),
            self.generator.as_ref(),
            user,
            token_type,
            self.policy.token_ttl(token_type),
            self.clock.utc(),
        )
        .await
    }

    /// Check that `token` may still change `user`.
    fn ensure_token_applies(user: &User, token: &MailToken) -> Result<(), Error> {
        if user.is_deleted() {
            return Err(UserError::Deleted {
                id: user.id().clone(),
            }
            .into());
        }
        if user.email() != token.email() {
            warn!(user_id = %user.id(), token_type = %token.token_type(), "token issued for a previous address");
            return Err(Error::invalid_request("token was issued for another address")
                .with_reason("token_email_mismatch"));
        }
        Ok(())
    }

    /// Claim a token of `token_type` and return it with its owning user.
    ///
    /// A token of another type is reported as not found. The used token is
    /// saved under its version, so of two concurrent claims only one wins.
    async fn claim(
        &self,
        raw_token: &str,
        token_type: MailTokenType,
        now: DateTime<Utc>,
    ) -> Result<(MailToken, User), Error> {
        let value = TokenValue::new(raw_token)?;
        let mut token = self
            .tokens
            .find_by_token(&value)
            .await
            .map_err(map_mail_token_repository_error)?
            .filter(|token| token.token_type() == token_type)
            .ok_or_else(Self::token_not_found)?;

        let user = self.load_user(token.user_id()).await?;
        Self::ensure_token_applies(&user, &token)?;

        if let Err(error) = token.redeem(now) {
            warn!(user_id = %user.id(), %token_type, %error, "token redemption rejected");
            return Err(error.into());
        }
        let used = self
            .tokens
            .save(&token)
            .await
            .map_err(map_mail_token_repository_error)?;
        Ok((used, user))
    }

    /// Apply `change` to the token's user, then delete the token.
    ///
    /// The token is already claimed, so a write that loses to another update
    /// of the same user is retried against a fresh copy instead of dropping
    /// the redemption.
    async fn apply<F>(&self, token: &MailToken, mut user: User, change: F) -> Result<User, Error>
    where
        F: Fn(&mut User) -> Result<(), Error>,
    {
        let mut attempt = 1;
        let saved = loop {
            change(&mut user)?;
            match self.users.save(&user).await {
                Ok(saved) => break saved,
                Err(UserRepositoryError::VersionMismatch { expected, actual })
                    if attempt < USER_WRITE_ATTEMPTS =>
                {
                    warn!(user_id = %user.id(), expected, actual, attempt, "user changed during token redemption, retrying");
                    attempt += 1;
                    user = self.load_user(token.user_id()).await?;
                    Self::ensure_token_applies(&user, token)?;
                }
                Err(error) => return Err(map_user_repository_error(error)),
            }
        };
        self.tokens
            .delete_by_token(token.token())
            .await
            .map_err(map_mail_token_repository_error)?;
        Ok(saved)
    }

    /// Issue an email-confirmation token for the user's current address.
    pub async fn request_email_confirmation(&self, user_id: &UserId) -> Result<MailToken, Error> {
        let user = self.load_user(user_id).await?;
        self.issue(&user, MailTokenType::EmailConfirmation).await
    }

    /// Redeem an email-confirmation token and mark the address verified.
    pub async fn confirm_email(&self, token: &str) -> Result<User, Error> {
        let now = self.clock.utc();
        let (token, user) = self
            .claim(token, MailTokenType::EmailConfirmation, now)
            .await?;
        let saved = self
            .apply(&token, user, |user| Ok(user.confirm_email(now)?))
            .await?;
        info!(user_id = %saved.id(), "email confirmed");
        Ok(saved)
    }

    /// Issue a password-reset token for the account owning `email`.
    pub async fn request_password_reset(&self, email: &str) -> Result<MailToken, Error> {
        let email = Email::new(email)?;
        let user = self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_user_repository_error)?
            .ok_or_else(Self::user_not_found)?;
        self.issue(&user, MailTokenType::PasswordReset).await
    }

    /// Redeem a password-reset token and replace the password.
    pub async fn reset_password(&self, token: &str, password: String) -> Result<User, Error> {
        let password = Password::new(password)?;
        let now = self.clock.utc();
        let (token, user) = self.claim(token, MailTokenType::PasswordReset, now).await?;
        let hasher = self.hasher.as_ref();
        let saved = self
            .apply(&token, user, |user| {
                Ok(user.change_password(&password, hasher, now)?)
            })
            .await?;
        info!(user_id = %saved.id(), "password reset");
        Ok(saved)
    }
}

#[cfg(test)]
#[path = "verification_service_tests.rs"]
mod tests;
