//! Personal name value object.

use serde::{Deserialize, Serialize};

use super::UserValidationError;

/// Maximum allowed length for each name part.
pub const NAME_PART_MAX: usize = 100;

/// A user's first and last name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersonNameDto", into = "PersonNameDto")]
pub struct PersonName {
    first: String,
    last: String,
}

impl PersonName {
    /// Validate both parts. Each is trimmed and must be non-blank.
    pub fn new(
        first: impl Into<String>,
        last: impl Into<String>,
    ) -> Result<Self, UserValidationError> {
        let first = normalise(
            first.into(),
            UserValidationError::EmptyFirstName,
            UserValidationError::FirstNameTooLong { max: NAME_PART_MAX },
        )?;
        let last = normalise(
            last.into(),
            UserValidationError::EmptyLastName,
            UserValidationError::LastNameTooLong { max: NAME_PART_MAX },
        )?;
        Ok(Self { first, last })
    }

    pub fn first(&self) -> &str {
        self.first.as_str()
    }

    pub fn last(&self) -> &str {
        self.last.as_str()
    }
}

fn normalise(
    raw: String,
    empty: UserValidationError,
    too_long: UserValidationError,
) -> Result<String, UserValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(empty);
    }
    if trimmed.chars().count() > NAME_PART_MAX {
        return Err(too_long);
    }
    Ok(trimmed.to_owned())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonNameDto {
    first: String,
    last: String,
}

impl From<PersonName> for PersonNameDto {
    fn from(value: PersonName) -> Self {
        Self {
            first: value.first,
            last: value.last,
        }
    }
}

impl TryFrom<PersonNameDto> for PersonName {
    type Error = UserValidationError;

    fn try_from(value: PersonNameDto) -> Result<Self, Self::Error> {
        PersonName::new(value.first, value.last)
    }
}
