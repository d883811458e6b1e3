//! TOTP `MfaGateway` backed by [`EnvelopeCipher`].

use std::sync::Arc;

use mockable::Clock;
use qrcode::QrCode;
use qrcode::render::svg;
use rand::RngCore;
use rand::rngs::OsRng;
use totp_rs::{Algorithm, TOTP};
use zeroize::Zeroizing;

use super::EnvelopeCipher;
use crate::domain::ports::{CapabilityError, MfaGateway};
use crate::domain::{Email, EncryptedSecret, MfaQrCode, MfaType};

const SEED_LEN: usize = 20;
const STEP_SECONDS: u64 = 30;
const DIGITS: usize = 6;
/// Codes from one step either side of now are accepted.
const SKEW_STEPS: u8 = 1;
const QR_MIN_DIMENSION: u32 = 200;

/// RFC 6238 authenticator support: 160-bit seeds, 6 digits, 30 second steps.
#[derive(Clone)]
pub struct TotpMfaGateway {
    cipher: EnvelopeCipher,
    clock: Arc<dyn Clock>,
}

impl TotpMfaGateway {
    pub fn new(cipher: EnvelopeCipher, clock: Arc<dyn Clock>) -> Self {
        Self { cipher, clock }
    }

    fn open_seed(&self, secret: &EncryptedSecret) -> Result<Zeroizing<Vec<u8>>, CapabilityError> {
        self.cipher.open(secret.ciphertext())
    }
}

/// Builds the authenticator for `seed`; the labels only feed the otpauth URI.
fn authenticator(
    seed: &[u8],
    issuer: Option<&str>,
    account: &str,
) -> Result<TOTP, CapabilityError> {
    TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        SKEW_STEPS,
        STEP_SECONDS,
        seed.to_vec(),
        issuer.map(str::to_owned),
        account.to_owned(),
    )
    .map_err(|err| CapabilityError::failed(format!("TOTP init: {err}")))
}

impl MfaGateway for TotpMfaGateway {
    fn generate_secret(&self, _mfa_type: MfaType) -> Result<EncryptedSecret, CapabilityError> {
        let mut seed = Zeroizing::new([0_u8; SEED_LEN]);
        OsRng
            .try_fill_bytes(&mut seed[..])
            .map_err(|err| CapabilityError::unavailable(format!("OS RNG failed: {err}")))?;
        let sealed = self.cipher.seal(&seed[..])?;
        EncryptedSecret::new(sealed).map_err(|err| CapabilityError::failed(err.to_string()))
    }

    fn accepts(
        &self,
        _mfa_type: MfaType,
        code: &str,
        secret: &EncryptedSecret,
    ) -> Result<bool, CapabilityError> {
        if code.len() != DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(false);
        }
        let Ok(now) = u64::try_from(self.clock.utc().timestamp()) else {
            return Ok(false);
        };
        let seed = self.open_seed(secret)?;
        Ok(authenticator(&seed, None, "")?.check(code, now))
    }

    fn confirmation_qr_code(
        &self,
        secret: &EncryptedSecret,
        account: &Email,
        issuer: &str,
    ) -> Result<MfaQrCode, CapabilityError> {
        let seed = self.open_seed(secret)?;
        let uri = authenticator(&seed, Some(issuer), account.as_ref())?.get_url();
        let code = QrCode::new(uri.as_bytes())
            .map_err(|err| CapabilityError::failed(format!("QR encoding failed: {err}")))?;
        let image = code
            .render::<svg::Color<'_>>()
            .min_dimensions(QR_MIN_DIMENSION, QR_MIN_DIMENSION)
            .build();
        Ok(MfaQrCode::new("image/svg+xml", image.into_bytes()))
    }
}
