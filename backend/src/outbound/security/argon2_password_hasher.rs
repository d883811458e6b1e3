//! Argon2id `PasswordHasher`.

use argon2::password_hash::{
    self, PasswordHash as PhcString, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::domain::ports::{CapabilityError, PasswordHasher};
use crate::domain::{Password, PasswordHash};

/// Produces salted Argon2id hashes in PHC string format.
#[derive(Debug, Clone, Default)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    /// Hasher with the crate's recommended cost parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hasher with explicit cost parameters.
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &Password) -> Result<PasswordHash, CapabilityError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = self
            .argon2()
            .hash_password(password.expose().as_bytes(), &salt)
            .map_err(|err| CapabilityError::failed(format!("argon2 hashing failed: {err}")))?;
        PasswordHash::new(phc.to_string()).map_err(|err| CapabilityError::failed(err.to_string()))
    }

    /// Verification reads the algorithm and cost from the stored PHC string.
    fn verify(&self, password: &Password, hash: &PasswordHash) -> Result<bool, CapabilityError> {
        let parsed = PhcString::new(hash.as_str())
            .map_err(|err| CapabilityError::failed(format!("stored hash is not PHC: {err}")))?;
        match self
            .argon2()
            .verify_password(password.expose().as_bytes(), &parsed)
        {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(CapabilityError::failed(format!(
                "argon2 verification failed: {err}"
            ))),
        }
    }
}
