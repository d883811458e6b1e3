//! Test doubles shared by unit tests (in `src/`) and integration tests (in
//! `tests/`).
//!
//! Compiled for `cfg(test)` and when the `test-support` feature is enabled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{CapabilityError, MfaGateway, PasswordHasher, TokenGenerator};
use crate::domain::{Email, EncryptedSecret, MfaQrCode, MfaType, Password, PasswordHash};

/// Clock that only moves when a test advances it.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    pub fn advance_seconds(&self, seconds: i64) {
        self.advance(TimeDelta::seconds(seconds));
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Reversible "hash" so assertions can read the stored value.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubPasswordHasher;

impl StubPasswordHasher {
    pub const PREFIX: &'static str = "hashed:";
}

impl PasswordHasher for StubPasswordHasher {
    fn hash(&self, password: &Password) -> Result<PasswordHash, CapabilityError> {
        PasswordHash::new(format!("{}{}", Self::PREFIX, password.expose()))
            .map_err(|err| CapabilityError::failed(err.to_string()))
    }

    fn verify(&self, password: &Password, hash: &PasswordHash) -> Result<bool, CapabilityError> {
        Ok(hash
            .as_str()
            .strip_prefix(Self::PREFIX)
            .is_some_and(|plain| plain == password.expose()))
    }
}

/// MFA gateway accepting a single fixed code.
#[derive(Debug, Clone)]
pub struct StubMfaGateway {
    accepted_code: String,
    issued: std::sync::Arc<AtomicU64>,
}

impl StubMfaGateway {
    pub fn accepting(code: impl Into<String>) -> Self {
        Self {
            accepted_code: code.into(),
            issued: std::sync::Arc::default(),
        }
    }
}

impl MfaGateway for StubMfaGateway {
    fn generate_secret(&self, mfa_type: MfaType) -> Result<EncryptedSecret, CapabilityError> {
        let serial = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        EncryptedSecret::new(format!("sealed:{}:{serial}", mfa_type.as_str()))
            .map_err(|err| CapabilityError::failed(err.to_string()))
    }

    fn accepts(
        &self,
        _mfa_type: MfaType,
        code: &str,
        _secret: &EncryptedSecret,
    ) -> Result<bool, CapabilityError> {
        Ok(code == self.accepted_code)
    }

    fn confirmation_qr_code(
        &self,
        _secret: &EncryptedSecret,
        account: &Email,
        issuer: &str,
    ) -> Result<MfaQrCode, CapabilityError> {
        let svg = format!("<svg><title>{issuer}:{account}</title></svg>");
        Ok(MfaQrCode::new("image/svg+xml", svg.into_bytes()))
    }
}

/// Token generator yielding `token-1`, `token-2`, ...
#[derive(Debug, Default)]
pub struct SequenceTokenGenerator(AtomicU64);

impl TokenGenerator for SequenceTokenGenerator {
    fn generate(&self) -> Result<String, CapabilityError> {
        let next = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("token-{next}"))
    }
}
