//! Port for unguessable mail token values.

use super::CapabilityError;

/// Source of high-entropy, URL-safe token strings.
#[cfg_attr(test, mockall::automock)]
pub trait TokenGenerator: Send + Sync {
    /// Produce a fresh token value.
    fn generate(&self) -> Result<String, CapabilityError>;
}
