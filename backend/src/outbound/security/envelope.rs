//! Envelope encryption for MFA seeds.
//!
//! Each secret is sealed under a fresh AES-256-GCM data key; the data key is
//! wrapped with RSA-OAEP (SHA-256). The sealed form is three URL-safe base64
//! segments joined by `.`: wrapped key, nonce, ciphertext.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::domain::ports::CapabilityError;

const DATA_KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// RSA key pair used to wrap per-secret data keys.
#[derive(Clone)]
pub struct EnvelopeCipher {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl fmt::Debug for EnvelopeCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeCipher").finish_non_exhaustive()
    }
}

impl EnvelopeCipher {
    /// Load the key pair from a PKCS#8 PEM private key.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, CapabilityError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|err| CapabilityError::unavailable(format!("invalid RSA key: {err}")))?;
        Ok(Self::from_private_key(private_key))
    }

    /// Generate a fresh key pair of `bits` bits.
    pub fn generate(bits: usize) -> Result<Self, CapabilityError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|err| CapabilityError::unavailable(format!("RSA keygen failed: {err}")))?;
        Ok(Self::from_private_key(private_key))
    }

    fn from_private_key(private_key: RsaPrivateKey) -> Self {
        let public_key = RsaPublicKey::from(&private_key);
        Self {
            private_key,
            public_key,
        }
    }

    /// Seal `plaintext` under a new data key.
    pub fn seal(&self, plaintext: &[u8]) -> Result<String, CapabilityError> {
        let mut data_key = Zeroizing::new([0_u8; DATA_KEY_LEN]);
        let mut nonce = [0_u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut data_key[..])
            .and_then(|()| OsRng.try_fill_bytes(&mut nonce))
            .map_err(|err| CapabilityError::unavailable(format!("OS RNG failed: {err}")))?;

        let cipher = Aes256Gcm::new_from_slice(&data_key[..])
            .map_err(|err| CapabilityError::failed(format!("bad data key: {err}")))?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| CapabilityError::failed("AES-GCM encryption failed"))?;
        let wrapped = self
            .public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &data_key[..])
            .map_err(|err| CapabilityError::failed(format!("key wrap failed: {err}")))?;

        Ok(format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(wrapped),
            URL_SAFE_NO_PAD.encode(nonce),
            URL_SAFE_NO_PAD.encode(ciphertext)
        ))
    }

    /// Recover the plaintext of a value produced by [`Self::seal`].
    pub fn open(&self, sealed: &str) -> Result<Zeroizing<Vec<u8>>, CapabilityError> {
        let malformed = || CapabilityError::failed("sealed value is malformed");
        let mut segments = sealed.split('.');
        let (Some(wrapped), Some(nonce), Some(ciphertext), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(malformed());
        };
        let decode = |segment: &str| URL_SAFE_NO_PAD.decode(segment).map_err(|_| malformed());
        let wrapped = decode(wrapped)?;
        let nonce = decode(nonce)?;
        let ciphertext = decode(ciphertext)?;
        if nonce.len() != NONCE_LEN {
            return Err(malformed());
        }

        let data_key = Zeroizing::new(
            self.private_key
                .decrypt(Oaep::new::<Sha256>(), &wrapped)
                .map_err(|err| CapabilityError::failed(format!("key unwrap failed: {err}")))?,
        );
        let cipher = Aes256Gcm::new_from_slice(&data_key[..])
            .map_err(|err| CapabilityError::failed(format!("bad data key: {err}")))?;
        cipher
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
            .map(Zeroizing::new)
            .map_err(|_| CapabilityError::failed("AES-GCM authentication failed"))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::OnceLock;

    use super::*;
    use rstest::rstest;

    /// Key generation is slow; share one small key across tests.
    pub(crate) fn test_cipher() -> EnvelopeCipher {
        static CIPHER: OnceLock<EnvelopeCipher> = OnceLock::new();
        CIPHER
            .get_or_init(|| EnvelopeCipher::generate(1024).expect("keygen"))
            .clone()
    }

    #[rstest]
    fn sealed_values_open_to_the_plaintext() {
        let cipher = test_cipher();
        let sealed = cipher.seal(b"twenty-byte-seed-000").expect("seal");

        assert_eq!(sealed.split('.').count(), 3);
        let opened = cipher.open(&sealed).expect("open");
        assert_eq!(opened.as_slice(), b"twenty-byte-seed-000");
    }

    #[rstest]
    fn sealing_twice_differs() {
        let cipher = test_cipher();
        let first = cipher.seal(b"seed").expect("seal");
        let second = cipher.seal(b"seed").expect("seal");

        assert_ne!(first, second);
    }

    #[rstest]
    #[case("")]
    #[case("only.two")]
    #[case("a.b.c.d")]
    #[case("!!.@@.##")]
    fn malformed_values_are_rejected(#[case] sealed: &str) {
        let error = test_cipher().open(sealed).expect_err("malformed");
        assert!(matches!(error, CapabilityError::Failed { .. }));
    }

    #[rstest]
    fn tampered_ciphertext_fails_authentication() {
        let cipher = test_cipher();
        let sealed = cipher.seal(b"seed").expect("seal");
        let (head, tail) = sealed.rsplit_once('.').expect("three segments");
        let mut bytes = URL_SAFE_NO_PAD.decode(tail).expect("base64");
        bytes[0] ^= 0xff;
        let tampered = format!("{head}.{}", URL_SAFE_NO_PAD.encode(bytes));

        assert!(cipher.open(&tampered).is_err());
    }

    #[rstest]
    fn foreign_key_cannot_open() {
        let sealed = test_cipher().seal(b"seed").expect("seal");
        let other = EnvelopeCipher::generate(1024).expect("keygen");

        assert!(other.open(&sealed).is_err());
    }

    #[rstest]
    fn invalid_pem_is_unavailable() {
        let error =
            EnvelopeCipher::from_pkcs8_pem("-----BEGIN NOTHING-----").expect_err("bad pem");
        assert!(matches!(error, CapabilityError::Unavailable { .. }));
    }
}
