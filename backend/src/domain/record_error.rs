//! Errors raised when a persisted record cannot be rehydrated.

/// A stored record failed revalidation on load.
///
/// Adapters treat this as a corrupt row: the record is never turned into an
/// aggregate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// A single field failed value-object validation.
    #[error("invalid {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    /// Two or more fields disagree with each other.
    #[error("inconsistent record: {0}")]
    Inconsistent(&'static str),
}

impl RecordError {
    /// Wrap a value-object validation failure for `field`.
    pub fn invalid_field(field: &'static str, error: impl std::fmt::Display) -> Self {
        Self::InvalidField {
            field,
            message: error.to_string(),
        }
    }
}
