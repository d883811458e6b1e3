//! Identity configuration loaded via OrthoConfig.
//!
//! Every value is optional; unset values fall back to the defaults in
//! [`crate::domain::policy`]. Environment variables use the `IDENTITY_`
//! prefix, e.g. `IDENTITY_PASSWORD_RESET_TTL_MINUTES=30`.

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::IdentityPolicy;
use crate::domain::policy::{
    DEFAULT_EMAIL_CONFIRMATION_TTL_HOURS, DEFAULT_MFA_CONFIRMATION_WINDOW_MINUTES,
    DEFAULT_PASSWORD_RESET_TTL_MINUTES, DEFAULT_TOTP_ISSUER,
};

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: u32 },
    #[error("totp_issuer must not be blank")]
    BlankIssuer,
}

/// Token lifetimes, MFA window, and authenticator label.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "IDENTITY")]
pub struct IdentitySettings {
    /// Email-confirmation token lifetime in hours.
    pub email_confirmation_ttl_hours: Option<u32>,
    /// Password-reset token lifetime in minutes.
    pub password_reset_ttl_minutes: Option<u32>,
    /// Time allowed to confirm a newly enrolled MFA device, in minutes.
    pub mfa_confirmation_window_minutes: Option<u32>,
    /// Issuer label embedded in the `otpauth://` URI.
    pub totp_issuer: Option<String>,
}

/// Longest accepted email-confirmation lifetime: 30 days.
pub const MAX_EMAIL_CONFIRMATION_TTL_HOURS: u32 = 720;
/// Longest accepted password-reset lifetime: one day.
pub const MAX_PASSWORD_RESET_TTL_MINUTES: u32 = 1440;
/// Longest accepted MFA confirmation window: one day.
pub const MAX_MFA_CONFIRMATION_WINDOW_MINUTES: u32 = 1440;

fn bounded(
    value: Option<u32>,
    default: i64,
    max: u32,
    field: &'static str,
) -> Result<i64, SettingsError> {
    match value {
        None => Ok(default),
        Some(0) => Err(SettingsError::NotPositive { field }),
        Some(value) if value > max => Err(SettingsError::TooLarge { field, max }),
        Some(value) => Ok(i64::from(value)),
    }
}

impl IdentitySettings {
    pub fn email_confirmation_ttl(&self) -> Result<TimeDelta, SettingsError> {
        bounded(
            self.email_confirmation_ttl_hours,
            DEFAULT_EMAIL_CONFIRMATION_TTL_HOURS,
            MAX_EMAIL_CONFIRMATION_TTL_HOURS,
            "email_confirmation_ttl_hours",
        )
        .map(TimeDelta::hours)
    }

    pub fn password_reset_ttl(&self) -> Result<TimeDelta, SettingsError> {
        bounded(
            self.password_reset_ttl_minutes,
            DEFAULT_PASSWORD_RESET_TTL_MINUTES,
            MAX_PASSWORD_RESET_TTL_MINUTES,
            "password_reset_ttl_minutes",
        )
        .map(TimeDelta::minutes)
    }

    pub fn mfa_confirmation_window(&self) -> Result<TimeDelta, SettingsError> {
        bounded(
            self.mfa_confirmation_window_minutes,
            DEFAULT_MFA_CONFIRMATION_WINDOW_MINUTES,
            MAX_MFA_CONFIRMATION_WINDOW_MINUTES,
            "mfa_confirmation_window_minutes",
        )
        .map(TimeDelta::minutes)
    }

    /// Return the configured issuer, falling back to the default.
    pub fn totp_issuer(&self) -> Result<&str, SettingsError> {
        match self.totp_issuer.as_deref().map(str::trim) {
            None => Ok(DEFAULT_TOTP_ISSUER),
            Some("") => Err(SettingsError::BlankIssuer),
            Some(issuer) => Ok(issuer),
        }
    }

    /// Build the policy consumed by the identity services.
    pub fn policy(&self) -> Result<IdentityPolicy, SettingsError> {
        Ok(IdentityPolicy {
            email_confirmation_ttl: self.email_confirmation_ttl()?,
            password_reset_ttl: self.password_reset_ttl()?,
            mfa_confirmation_window: self.mfa_confirmation_window()?,
            totp_issuer: self.totp_issuer()?.to_owned(),
        })
    }
}
