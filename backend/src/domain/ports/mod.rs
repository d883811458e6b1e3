//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Repository ports are async and implemented by `outbound::persistence`.
//! Capability ports (hashing, MFA secrets, token generation) are synchronous;
//! aggregates receive them as method arguments.

mod macros;
pub(crate) use macros::define_port_error;

mod capability;
mod mail_token_repository;
mod mfa_gateway;
mod password_hasher;
mod role_repository;
mod token_generator;
mod user_repository;

pub use capability::CapabilityError;
#[cfg(test)]
pub use mail_token_repository::MockMailTokenRepository;
pub use mail_token_repository::{MailTokenRepository, MailTokenRepositoryError};
#[cfg(test)]
pub use mfa_gateway::MockMfaGateway;
pub use mfa_gateway::MfaGateway;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::PasswordHasher;
#[cfg(test)]
pub use role_repository::MockRoleRepository;
pub use role_repository::{RoleRepository, RoleRepositoryError};
#[cfg(test)]
pub use token_generator::MockTokenGenerator;
pub use token_generator::TokenGenerator;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
