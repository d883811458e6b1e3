//! Role value objects.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum allowed length for a role name.
pub const ROLE_NAME_MIN: usize = 3;
/// Maximum allowed length for a role name.
pub const ROLE_NAME_MAX: usize = 100;
/// Maximum allowed length for a role description.
pub const ROLE_DESCRIPTION_MAX: usize = 255;

/// Validation errors returned by role value objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleValidationError {
    EmptyName,
    NameTooShort { min: usize },
    NameTooLong { max: usize },
    DescriptionTooLong { max: usize },
}

impl fmt::Display for RoleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "role name must not be empty"),
            Self::NameTooShort { min } => {
                write!(f, "role name must be at least {min} characters")
            }
            Self::NameTooLong { max } => {
                write!(f, "role name must be at most {max} characters")
            }
            Self::DescriptionTooLong { max } => {
                write!(f, "role description must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for RoleValidationError {}

/// Unique, human readable role name.
///
/// Surrounding whitespace is trimmed before the length check.
///
/// # Examples
/// ```
/// use identity_backend::domain::RoleName;
///
/// let name = RoleName::new("  ADMIN ").expect("valid role name");
/// assert_eq!(name.as_ref(), "ADMIN");
/// assert!(RoleName::new("ab").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    /// Validate and construct a [`RoleName`].
    pub fn new(name: impl Into<String>) -> Result<Self, RoleValidationError> {
        Self::from_owned(name.into())
    }

    fn from_owned(name: String) -> Result<Self, RoleValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RoleValidationError::EmptyName);
        }

        let length = trimmed.chars().count();
        if length < ROLE_NAME_MIN {
            return Err(RoleValidationError::NameTooShort { min: ROLE_NAME_MIN });
        }
        if length > ROLE_NAME_MAX {
            return Err(RoleValidationError::NameTooLong { max: ROLE_NAME_MAX });
        }

        if trimmed.len() == name.len() {
            Ok(Self(name))
        } else {
            Ok(Self(trimmed.to_owned()))
        }
    }
}

impl AsRef<str> for RoleName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<RoleName> for String {
    fn from(value: RoleName) -> Self {
        value.0
    }
}

impl TryFrom<String> for RoleName {
    type Error = RoleValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Free-form role description, empty by default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleDescription(String);

impl RoleDescription {
    /// Validate and construct a [`RoleDescription`].
    pub fn new(description: impl Into<String>) -> Result<Self, RoleValidationError> {
        Self::from_owned(description.into())
    }

    fn from_owned(description: String) -> Result<Self, RoleValidationError> {
        if description.chars().count() > ROLE_DESCRIPTION_MAX {
            return Err(RoleValidationError::DescriptionTooLong {
                max: ROLE_DESCRIPTION_MAX,
            });
        }
        Ok(Self(description))
    }

    /// True when no description was supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for RoleDescription {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RoleDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<RoleDescription> for String {
    fn from(value: RoleDescription) -> Self {
        value.0
    }
}

impl TryFrom<String> for RoleDescription {
    type Error = RoleValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Validated attributes shared by role creation and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDetails {
    pub name: RoleName,
    pub description: RoleDescription,
    pub is_default: bool,
}

impl RoleDetails {
    /// Validate raw inputs into [`RoleDetails`].
    ///
    /// A missing description becomes the empty description.
    pub fn try_new(
        name: impl Into<String>,
        description: Option<String>,
        is_default: bool,
    ) -> Result<Self, RoleValidationError> {
        let name = RoleName::new(name)?;
        let description = description
            .map(RoleDescription::new)
            .transpose()?
            .unwrap_or_default();
        Ok(Self {
            name,
            description,
            is_default,
        })
    }
}
