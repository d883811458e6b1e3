//! Aggregate identifiers.
//!
//! Every aggregate is keyed by a UUID. The wrappers keep the parsed UUID and
//! its canonical lowercase hyphenated string side by side so adapters can
//! borrow either form. Any accepted spelling normalises to that string, so
//! equality and ordering follow the UUID.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierValidationError {
    /// The identifier string was empty.
    Empty { kind: &'static str },
    /// The identifier string was not a valid UUID.
    Invalid { kind: &'static str },
}

impl fmt::Display for IdentifierValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { kind } => write!(f, "{kind} must not be empty"),
            Self::Invalid { kind } => write!(f, "{kind} must be a valid UUID"),
        }
    }
}

impl std::error::Error for IdentifierValidationError {}

macro_rules! define_identifier {
    ($(#[$meta:meta])* $name:ident => $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Uuid, String);

        impl $name {
            /// Validate and construct the identifier from borrowed input.
            pub fn new(id: impl AsRef<str>) -> Result<Self, IdentifierValidationError> {
                Self::from_owned(id.as_ref().to_owned())
            }

            /// Wrap an already parsed UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid, uuid.to_string())
            }

            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self::from_uuid(Uuid::new_v4())
            }

            fn from_owned(id: String) -> Result<Self, IdentifierValidationError> {
                if id.is_empty() {
                    return Err(IdentifierValidationError::Empty { kind: $kind });
                }
                if id.trim() != id {
                    return Err(IdentifierValidationError::Invalid { kind: $kind });
                }
                let parsed = Uuid::parse_str(&id)
                    .map_err(|_| IdentifierValidationError::Invalid { kind: $kind })?;
                Ok(Self::from_uuid(parsed))
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.1.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_ref())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.1
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_owned(value)
            }
        }
    };
}

define_identifier! {
    /// Stable user identifier.
    UserId => "user id"
}

define_identifier! {
    /// Stable role identifier.
    RoleId => "role id"
}

define_identifier! {
    /// Identifier of a user's embedded MFA device.
    MfaDeviceId => "mfa device id"
}

define_identifier! {
    /// Identifier of an issued mail token.
    MailTokenId => "mail token id"
}

/// Maximum accepted length of a customer reference.
pub const CUSTOMER_ID_MAX: usize = 255;

/// Validation errors for [`CustomerId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerIdValidationError {
    Empty,
    TooLong { max: usize },
}

impl fmt::Display for CustomerIdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "customer id must not be empty"),
            Self::TooLong { max } => write!(f, "customer id must be at most {max} characters"),
        }
    }
}

impl std::error::Error for CustomerIdValidationError {}

/// Opaque reference to the customer record owned by the commerce platform.
///
/// The identity backend never interprets the value; it only requires it to
/// be present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerId(String);

impl CustomerId {
    /// Validate and construct a [`CustomerId`].
    pub fn new(id: impl Into<String>) -> Result<Self, CustomerIdValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CustomerIdValidationError::Empty);
        }
        if id.chars().count() > CUSTOMER_ID_MAX {
            return Err(CustomerIdValidationError::TooLong {
                max: CUSTOMER_ID_MAX,
            });
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for CustomerId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<CustomerId> for String {
    fn from(value: CustomerId) -> Self {
        value.0
    }
}

impl TryFrom<String> for CustomerId {
    type Error = CustomerIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
