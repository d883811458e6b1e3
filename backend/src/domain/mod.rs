//! Identity domain: aggregates, value objects, ports, and services.
//!
//! Aggregates (`Role`, `User` with its embedded `MfaDevice`, `MailToken`) are
//! synchronous value holders that enforce their own invariants. Services load
//! them through repository ports, call their mutators with capabilities and
//! the current time, and persist the result under optimistic concurrency.
//!
//! Public surface:
//! - `Error` and `ErrorCode`: transport-agnostic failure payload.
//! - Aggregates and value objects, re-exported from their modules.
//! - `ports`: repository and capability traits.
//! - `RoleService`, `AccountService`, `VerificationService`, `MfaService`.

pub mod error;
pub mod ids;
pub mod mail_token;
pub mod mfa;
pub mod policy;
pub mod ports;
pub mod role;
pub mod user;

mod account_service;
mod mfa_service;
mod record_error;
mod repository_errors;
mod role_service;
mod verification_service;

pub use self::account_service::{AccountService, RegisterUserRequest};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{
    CustomerId, CustomerIdValidationError, IdentifierValidationError, MailTokenId, MfaDeviceId,
    RoleId, UserId,
};
pub use self::mail_token::{
    MailToken, MailTokenError, MailTokenRecord, MailTokenType, MailTokenValidationError,
    TokenValue,
};
pub use self::mfa::{
    DeviceName, EncryptedSecret, MfaDevice, MfaDeviceRecord, MfaError, MfaQrCode, MfaStatus,
    MfaType, MfaValidationError,
};
pub use self::mfa_service::{MfaEnrollment, MfaService};
pub use self::policy::IdentityPolicy;
pub use self::record_error::RecordError;
pub use self::role::{
    Role, RoleDescription, RoleDetails, RoleError, RoleName, RoleRecord, RoleValidationError,
};
pub use self::role_service::RoleService;
pub use self::user::{
    Email, NewUser, Password, PasswordHash, PersonName, User, UserError, UserRecord,
    UserValidationError,
};
pub use self::verification_service::VerificationService;

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use identity_backend::domain::{DomainResult, Error};
///
/// fn lookup() -> DomainResult<()> {
///     Err(Error::not_found("no such user"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
