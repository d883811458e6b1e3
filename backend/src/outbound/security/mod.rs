//! Reference adapters for the capability ports.
//!
//! - `Argon2PasswordHasher`: Argon2id PHC hashes.
//! - `EnvelopeCipher`: RSA-OAEP wrapped AES-256-GCM sealing.
//! - `TotpMfaGateway`: RFC 6238 codes over sealed seeds, SVG QR enrollment.
//! - `RandomTokenGenerator`: URL-safe random mail tokens.

mod argon2_password_hasher;
pub(crate) mod envelope;
mod random_token_generator;
mod totp_mfa_gateway;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use envelope::EnvelopeCipher;
pub use random_token_generator::RandomTokenGenerator;
pub use totp_mfa_gateway::TotpMfaGateway;
