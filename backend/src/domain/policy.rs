//! Time windows and labels applied by the identity services.

use chrono::TimeDelta;

use crate::domain::MailTokenType;

/// Default email-confirmation token lifetime, in hours.
pub const DEFAULT_EMAIL_CONFIRMATION_TTL_HOURS: i64 = 10;
/// Default password-reset token lifetime, in minutes.
pub const DEFAULT_PASSWORD_RESET_TTL_MINUTES: i64 = 60;
/// Default MFA confirmation window, in minutes.
pub const DEFAULT_MFA_CONFIRMATION_WINDOW_MINUTES: i64 = 10;
/// Default issuer label shown by authenticator apps.
pub const DEFAULT_TOTP_ISSUER: &str = "Shop";

/// Service-level policy knobs.
///
/// Built from [`IdentitySettings`](crate::settings::IdentitySettings) in
/// production and constructed directly in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPolicy {
    pub email_confirmation_ttl: TimeDelta,
    pub password_reset_ttl: TimeDelta,
    pub mfa_confirmation_window: TimeDelta,
    pub totp_issuer: String,
}

impl IdentityPolicy {
    /// Lifetime of a freshly issued token of `token_type`.
    pub fn token_ttl(&self, token_type: MailTokenType) -> TimeDelta {
        match token_type {
            MailTokenType::EmailConfirmation => self.email_confirmation_ttl,
            MailTokenType::PasswordReset => self.password_reset_ttl,
        }
    }
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self {
            email_confirmation_ttl: TimeDelta::hours(DEFAULT_EMAIL_CONFIRMATION_TTL_HOURS),
            password_reset_ttl: TimeDelta::minutes(DEFAULT_PASSWORD_RESET_TTL_MINUTES),
            mfa_confirmation_window: TimeDelta::minutes(DEFAULT_MFA_CONFIRMATION_WINDOW_MINUTES),
            totp_issuer: DEFAULT_TOTP_ISSUER.to_owned(),
        }
    }
}
