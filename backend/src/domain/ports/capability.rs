//! Failure type shared by the synchronous capability ports.

use crate::domain::Error;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing, MFA, and token generation
    /// capabilities.
    ///
    /// The message is for logs only. Services convert this error into a
    /// generic internal failure before it reaches a caller.
    pub enum CapabilityError {
        /// The capability has no usable backing resource (missing key, RNG).
        Unavailable { message: String } => "capability unavailable: {message}",
        /// The capability rejected or failed to process its input.
        Failed { message: String } => "capability failed: {message}",
    }
}

impl From<CapabilityError> for Error {
    fn from(value: CapabilityError) -> Self {
        tracing::error!(error = %value, "identity capability failed");
        Error::internal("internal identity failure")
    }
}
