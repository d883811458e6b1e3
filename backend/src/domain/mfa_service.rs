//! MFA enrollment service.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{MfaGateway, UserRepository};
use crate::domain::repository_errors::map_user_repository_error;
use crate::domain::{
    DeviceName, Error, IdentityPolicy, MfaError, MfaQrCode, MfaType, User, UserError, UserId,
};

/// Result of starting enrollment: the saved user and the QR code to scan.
#[derive(Debug, Clone)]
pub struct MfaEnrollment {
    pub user: User,
    pub qr_code: MfaQrCode,
}

/// Drives the MFA device lifecycle of a user.
#[derive(Clone)]
pub struct MfaService<U> {
    users: Arc<U>,
    gateway: Arc<dyn MfaGateway>,
    clock: Arc<dyn Clock>,
    policy: IdentityPolicy,
}

impl<U> MfaService<U> {
    pub fn new(
        users: Arc<U>,
        gateway: Arc<dyn MfaGateway>,
        clock: Arc<dyn Clock>,
        policy: IdentityPolicy,
    ) -> Self {
        Self {
            users,
            gateway,
            clock,
            policy,
        }
    }
}

impl<U> MfaService<U>
where
    U: UserRepository,
{
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

    /// Enroll a device and render its provisioning QR code.
    ///
    /// A device still pending confirmation is replaced.
    pub async fn enroll(
        &self,
        user_id: &UserId,
        mfa_type: MfaType,
        device_name: &str,
    ) -> Result<MfaEnrollment, Error> {
        let device_name = DeviceName::new(device_name)?;
        let mut user = self.load(user_id).await?;
        let secret = user
            .create_mfa(
                mfa_type,
                device_name,
                self.gateway.as_ref(),
                self.clock.utc(),
                self.policy.mfa_confirmation_window,
            )?
            .secret()
            .clone();
        let qr_code =
            self.gateway
                .confirmation_qr_code(&secret, user.email(), &self.policy.totp_issuer)?;
        let saved = self.persist(&user).await?;
        info!(user_id = %saved.id(), mfa_type = mfa_type.as_str(), "MFA enrollment started");
        Ok(MfaEnrollment {
            user: saved,
            qr_code,
        })
    }

    /// Confirm the pending device with a code from the authenticator.
    pub async fn confirm(&self, user_id: &UserId, code: &str) -> Result<User, Error> {
        let mut user = self.load(user_id).await?;
        match user.confirm_mfa_device(code, self.gateway.as_ref(), self.clock.utc()) {
            Ok(()) => {}
            Err(UserError::Mfa(
                error @ (MfaError::ConfirmationFailed | MfaError::ConfirmationExpired),
            )) => {
                warn!(user_id = %user.id(), %error, "MFA confirmation rejected");
                return Err(error.into());
            }
            Err(error) => return Err(error.into()),
        }
        let saved = self.persist(&user).await?;
        info!(user_id = %saved.id(), "MFA enabled");
        Ok(saved)
    }

    /// Remove the device and its secret.
    pub async fn disable(&self, user_id: &UserId) -> Result<User, Error> {
        let mut user = self.load(user_id).await?;
        user.disable_mfa(self.clock.utc())?;
        let saved = self.persist(&user).await?;
        info!(user_id = %saved.id(), "MFA disabled");
        Ok(saved)
    }
}

#[cfg(test)]
#[path = "mfa_service_tests.rs"]
mod tests;
