//! Mapping from repository port errors to domain errors.
//!
//! Connection and query failures are logged with their detail and surface as
//! generic failures. Version mismatches become `concurrent_modification`
//! conflicts.

use tracing::{error, warn};

use crate::domain::Error;
use crate::domain::ports::{MailTokenRepositoryError, RoleRepositoryError, UserRepositoryError};

fn store_unavailable(store: &'static str, message: &str) -> Error {
    error!(store, %message, "identity store connection failed");
    Error::service_unavailable("identity store unavailable")
}

fn store_failed(store: &'static str, message: &str) -> Error {
    error!(store, %message, "identity store query failed");
    Error::internal("internal identity failure")
}

fn version_conflict(store: &'static str, expected: u64, actual: u64) -> Error {
    warn!(store, expected, actual, "rejected stale write");
    Error::concurrent_modification(expected, actual)
}

pub(crate) fn map_role_repository_error(error: RoleRepositoryError) -> Error {
    match error {
        RoleRepositoryError::Connection { message } => store_unavailable("roles", &message),
        RoleRepositoryError::Query { message } => store_failed("roles", &message),
        RoleRepositoryError::VersionMismatch { expected, actual } => {
            version_conflict("roles", expected, actual)
        }
        RoleRepositoryError::NotFound { id } => {
            Error::not_found(format!("role {id} not found")).with_reason("role_not_found")
        }
        RoleRepositoryError::DuplicateName { name } => {
            Error::conflict(format!("role name {name} is already taken"))
                .with_reason("role_name_taken")
        }
    }
}

pub(crate) fn map_user_repository_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => store_unavailable("users", &message),
        UserRepositoryError::Query { message } => store_failed("users", &message),
        UserRepositoryError::VersionMismatch { expected, actual } => {
            version_conflict("users", expected, actual)
        }
        UserRepositoryError::NotFound { id } => {
            Error::not_found(format!("user {id} not found")).with_reason("user_not_found")
        }
        UserRepositoryError::DuplicateEmail { .. } => {
            Error::conflict("email is already registered").with_reason("email_taken")
        }
    }
}

pub(crate) fn map_mail_token_repository_error(error: MailTokenRepositoryError) -> Error {
    match error {
        MailTokenRepositoryError::Connection { message } => {
            store_unavailable("mail_tokens", &message)
        }
        MailTokenRepositoryError::Query { message } => store_failed("mail_tokens", &message),
        MailTokenRepositoryError::VersionMismatch { expected, actual } => {
            version_conflict("mail_tokens", expected, actual)
        }
        MailTokenRepositoryError::NotFound { .. } => {
            Error::not_found("token not found").with_reason("token_not_found")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    fn version_mismatch_becomes_concurrent_modification() {
        let error = map_role_repository_error(RoleRepositoryError::version_mismatch(1_u64, 2_u64));
        assert_eq!(error.code(), ErrorCode::Conflict);
        assert_eq!(error.reason(), Some("concurrent_modification"));
    }

    #[rstest]
    fn connection_detail_is_not_returned() {
        let error = map_user_repository_error(UserRepositoryError::connection("pg: refused"));
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
        assert!(!error.message().contains("refused"));
    }

    #[rstest]
    fn query_detail_is_not_returned() {
        let error =
            map_mail_token_repository_error(MailTokenRepositoryError::query("syntax error"));
        assert_eq!(error.code(), ErrorCode::InternalError);
        assert!(!error.message().contains("syntax"));
    }

    #[rstest]
    fn duplicate_email_does_not_echo_the_address() {
        let error =
            map_user_repository_error(UserRepositoryError::duplicate_email("ada@example.com"));
        assert_eq!(error.reason(), Some("email_taken"));
        assert!(!error.message().contains("ada@example.com"));
    }
}
