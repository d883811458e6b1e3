//! Mail token aggregate.
//!
//! Mail tokens gate email confirmation and password reset. Each token is
//! single use and time bound: [`MailToken::redeem`] succeeds at most once and
//! never after `expires_at`.

mod record;

pub use record::MailTokenRecord;

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{CapabilityError, TokenGenerator};
use crate::domain::{Email, Error, MailTokenId, UserId};

/// What a token authorises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MailTokenType {
    EmailConfirmation,
    PasswordReset,
}

impl MailTokenType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmailConfirmation => "EMAIL_CONFIRMATION",
            Self::PasswordReset => "PASSWORD_RESET",
        }
    }
}

impl fmt::Display for MailTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors for mail token inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTokenValidationError {
    EmptyToken,
    NonPositiveTtl,
    /// `now + ttl` falls outside the representable time range.
    TtlOutOfRange,
}

impl fmt::Display for MailTokenValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyToken => write!(f, "token value must not be empty"),
            Self::NonPositiveTtl => write!(f, "token lifetime must be positive"),
            Self::TtlOutOfRange => write!(f, "token lifetime is too large"),
        }
    }
}

impl std::error::Error for MailTokenValidationError {}

/// Opaque token string sent to the user by mail.
///
/// `Debug` is redacted; the value is a bearer credential.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TokenValue(String);

impl TokenValue {
    pub fn new(value: impl Into<String>) -> Result<Self, MailTokenValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(MailTokenValidationError::EmptyToken);
        }
        Ok(Self(value))
    }

    /// Borrow the raw token for mailing or lookup.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenValue(<redacted>)")
    }
}

/// Errors raised by mail token operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MailTokenError {
    #[error(transparent)]
    Validation(#[from] MailTokenValidationError),
    #[error("token has expired")]
    Expired,
    #[error("token has already been used")]
    AlreadyUsed,
    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

impl From<MailTokenValidationError> for Error {
    fn from(value: MailTokenValidationError) -> Self {
        Error::validation(&value)
    }
}

impl From<MailTokenError> for Error {
    fn from(value: MailTokenError) -> Self {
        match value {
            MailTokenError::Validation(error) => Error::from(error),
            MailTokenError::Expired => {
                Error::invalid_request(value.to_string()).with_reason("token_expired")
            }
            MailTokenError::AlreadyUsed => {
                Error::conflict(value.to_string()).with_reason("token_already_used")
            }
            MailTokenError::Capability(error) => Error::from(error),
        }
    }
}

/// Single-use, expiring token bound to a user and an email snapshot.
///
/// ## Invariants
/// - `used_at` is present exactly when the token has been used.
/// - A token is redeemed at most once and never after `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailToken {
    id: MailTokenId,
    email: Email,
    user_id: UserId,
    token: TokenValue,
    token_type: MailTokenType,
    used_at: Option<DateTime<Utc>>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    version: u64,
}

impl MailToken {
    /// Issue a fresh token valid for `ttl` from `now`.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeDelta, Utc};
    /// use identity_backend::domain::ports::{CapabilityError, TokenGenerator};
    /// use identity_backend::domain::{Email, MailToken, MailTokenType, UserId};
    ///
    /// struct Fixed;
    /// impl TokenGenerator for Fixed {
    ///     fn generate(&self) -> Result<String, CapabilityError> {
    ///         Ok("abc123".to_owned())
    ///     }
    /// }
    ///
    /// let now = Utc::now();
    /// let email = Email::new("ada@example.com").expect("valid email");
    /// let token = MailToken::issue(
    ///     email,
    ///     UserId::random(),
    ///     MailTokenType::EmailConfirmation,
    ///     TimeDelta::hours(10),
    ///     &Fixed,
    ///     now,
    /// )
    /// .expect("token issued");
    /// assert!(!token.is_expired(now));
    /// assert!(token.is_expired(now + TimeDelta::hours(11)));
    /// ```
    pub fn issue(
        email: Email,
        user_id: UserId,
        token_type: MailTokenType,
        ttl: TimeDelta,
        generator: &dyn TokenGenerator,
        now: DateTime<Utc>,
    ) -> Result<Self, MailTokenError> {
        if ttl <= TimeDelta::zero() {
            return Err(MailTokenValidationError::NonPositiveTtl.into());
        }
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or(MailTokenValidationError::TtlOutOfRange)?;
        let token = TokenValue::new(generator.generate()?)?;
        Ok(Self {
            id: MailTokenId::random(),
            email,
            user_id,
            token,
            token_type,
            used_at: None,
            expires_at,
            created_at: now,
            version: 0,
        })
    }

    /// True once `now` is strictly past `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Consume the token.
    ///
    /// A used token reports [`MailTokenError::AlreadyUsed`] whether or not it
    /// has since expired; an unused token past its deadline reports
    /// [`MailTokenError::Expired`] and stays unused.
    pub fn redeem(&mut self, now: DateTime<Utc>) -> Result<(), MailTokenError> {
        if self.is_used() {
            return Err(MailTokenError::AlreadyUsed);
        }
        if self.is_expired(now) {
            return Err(MailTokenError::Expired);
        }
        self.used_at = Some(now);
        Ok(())
    }

    pub fn id(&self) -> &MailTokenId {
        &self.id
    }

    /// Address the token was sent to, captured at issue time.
    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn token(&self) -> &TokenValue {
        &self.token
    }

    pub fn token_type(&self) -> MailTokenType {
        self.token_type
    }

    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    pub fn used_at(&self) -> Option<DateTime<Utc>> {
        self.used_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests;
